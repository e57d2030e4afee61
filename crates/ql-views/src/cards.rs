//! Arrangement of a response's visuals into result cards

use egui::{RichText, Ui};
use ql_core::RenderContext;
use ql_data::{check_axis_fields, QueryResponse, VisualSpec};

use crate::{ChartView, ResultView, TableView, ViewerContext};

/// Which visuals a card shows, by index into the response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardLayout {
    /// Chart and table side by side, titled by the chart
    Combined { table: usize, chart: usize },
    Single(usize),
}

/// The first table and the first chart share a card when both exist; every
/// other visual gets a card of its own, in response order.
pub fn arrange_cards(visuals: &[VisualSpec]) -> Vec<CardLayout> {
    let table = visuals.iter().position(|v| !v.kind.is_chart());
    let chart = visuals.iter().position(|v| v.kind.is_chart());

    let mut cards = Vec::with_capacity(visuals.len());
    let paired = match (table, chart) {
        (Some(table), Some(chart)) => {
            cards.push(CardLayout::Combined { table, chart });
            [Some(table), Some(chart)]
        }
        _ => [None, None],
    };
    cards.extend(
        (0..visuals.len())
            .filter(|i| !paired.contains(&Some(*i)))
            .map(CardLayout::Single),
    );
    cards
}

/// One card of the result area
pub struct ResultCard {
    title: String,
    sql: String,
    table: Option<TableView>,
    chart: Option<ChartView>,
}

impl ResultCard {
    fn new(sql: &str, table: Option<&VisualSpec>, chart: Option<&VisualSpec>, render: &RenderContext, page_size: usize) -> Self {
        let chart = chart.and_then(|visual| ChartView::new(visual, render));
        let table = table.map(|visual| TableView::new("Results", visual.data.clone(), render, page_size));
        Self {
            title: chart.as_ref().map(|c| c.title().to_string()).unwrap_or_default(),
            sql: sql.to_string(),
            table,
            chart,
        }
    }

    /// Chart title, empty for table-only cards
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn table(&self) -> Option<&TableView> {
        self.table.as_ref()
    }

    pub fn table_mut(&mut self) -> Option<&mut TableView> {
        self.table.as_mut()
    }

    pub fn chart(&self) -> Option<&ChartView> {
        self.chart.as_ref()
    }

    pub fn chart_mut(&mut self) -> Option<&mut ChartView> {
        self.chart.as_mut()
    }

    pub fn ui(&mut self, ctx: &ViewerContext, ui: &mut Ui) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            if !self.title.is_empty() {
                ui.heading(&self.title);
            }
            ui.label(RichText::new(&self.sql).monospace().small().weak());
            ui.add_space(4.0);

            match (&mut self.chart, &mut self.table) {
                (Some(chart), Some(table)) => {
                    ui.columns(2, |columns| {
                        chart.ui(ctx, &mut columns[0]);
                        table.ui(ctx, &mut columns[1]);
                    });
                }
                (Some(chart), None) => chart.ui(ctx, ui),
                (None, Some(table)) => table.ui(ctx, ui),
                (None, None) => {}
            }
        });
    }
}

/// Cards for one query answer
#[derive(Default)]
pub struct ResultCards {
    cards: Vec<ResultCard>,
}

impl ResultCards {
    pub fn from_response(response: &QueryResponse, render: &RenderContext, page_size: usize) -> Self {
        for visual in response.visuals.iter().filter(|v| v.kind.is_chart()) {
            check_axis_fields(&visual.data, visual.x.as_deref(), visual.y.as_ref());
        }

        let visuals = &response.visuals;
        let cards: Vec<ResultCard> = arrange_cards(visuals)
            .into_iter()
            .map(|layout| match layout {
                CardLayout::Combined { table, chart } => {
                    ResultCard::new(&response.sql, Some(&visuals[table]), Some(&visuals[chart]), render, page_size)
                }
                CardLayout::Single(index) => {
                    let visual = &visuals[index];
                    if visual.kind.is_chart() {
                        ResultCard::new(&response.sql, None, Some(visual), render, page_size)
                    } else {
                        ResultCard::new(&response.sql, Some(visual), None, render, page_size)
                    }
                }
            })
            .collect();

        tracing::info!("Arranged {} visuals into {} cards", visuals.len(), cards.len());
        Self { cards }
    }

    pub fn cards(&self) -> &[ResultCard] {
        &self.cards
    }

    pub fn cards_mut(&mut self) -> &mut [ResultCard] {
        &mut self.cards
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn ui(&mut self, ctx: &ViewerContext, ui: &mut Ui) {
        if self.cards.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label("No results");
            });
            return;
        }
        for card in &mut self.cards {
            card.ui(ctx, ui);
            ui.add_space(8.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_data::VisualKind;
    use serde_json::json;

    fn visual(kind: VisualKind) -> VisualSpec {
        VisualSpec {
            kind,
            x: Some("ay".into()),
            y: Some("satis".into()),
            data: serde_json::from_value(json!([{"ay": "Ocak", "satis": 5}])).unwrap(),
        }
    }

    #[test]
    fn test_table_and_chart_combine() {
        let visuals = vec![
            visual(VisualKind::Bar),
            visual(VisualKind::Table),
            visual(VisualKind::Pie),
        ];
        assert_eq!(
            arrange_cards(&visuals),
            vec![CardLayout::Combined { table: 1, chart: 0 }, CardLayout::Single(2)]
        );
    }

    #[test]
    fn test_lone_table_keeps_its_card() {
        let visuals = vec![visual(VisualKind::Table)];
        assert_eq!(arrange_cards(&visuals), vec![CardLayout::Single(0)]);
        assert!(arrange_cards(&[]).is_empty());
    }

    #[test]
    fn test_second_table_gets_own_card() {
        let visuals = vec![
            visual(VisualKind::Table),
            visual(VisualKind::Table),
            visual(VisualKind::Line),
        ];
        assert_eq!(
            arrange_cards(&visuals),
            vec![CardLayout::Combined { table: 0, chart: 2 }, CardLayout::Single(1)]
        );
    }

    #[test]
    fn test_cards_from_response() {
        let response = QueryResponse {
            sql: "SELECT ay, satis FROM s".into(),
            visuals: vec![visual(VisualKind::Table), visual(VisualKind::Bar)],
        };
        let cards = ResultCards::from_response(&response, &RenderContext::default(), 10);

        assert_eq!(cards.cards().len(), 1);
        let card = &cards.cards()[0];
        assert_eq!(card.title(), "satis vs ay");
        assert_eq!(card.sql(), "SELECT ay, satis FROM s");
        assert!(card.table().is_some_and(|t| t.has_data()));
        assert!(card.chart().is_some_and(|c| c.has_data()));
    }
}
