use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::Stylize,
    symbols::border,
    text::Line,
    widgets::{Block, Paragraph, Row, Table, Widget},
};

use crate::domain::TSConfig;
use crate::store::{Store, TableState};

pub const COLUMN_WIDTH_MARGIN: usize = 2;

pub struct StoreUI {
    max_column_width: usize,
}

impl StoreUI {
    pub fn new(cfg: &TSConfig) -> Self {
        Self {
            max_column_width: cfg.max_column_width,
        }
    }

    /// Render from a snapshot of the store. The ui only reads; writes go
    /// through the controller messages.
    pub fn draw(&self, store: &Store, frame: &mut Frame) {
        let state = store.snapshot();
        frame.render_widget(
            TableView {
                state: &state,
                max_column_width: self.max_column_width,
            },
            frame.area(),
        );
    }
}

struct TableView<'a> {
    state: &'a TableState,
    max_column_width: usize,
}

impl Widget for TableView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = Line::from(" tablestore ".bold());
        let instructions = Line::from(vec![
            " Toggle table ".into(),
            "<T>".blue().bold(),
            " Quit ".into(),
            "<Q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);

        if !self.state.visible {
            Paragraph::new("Table hidden")
                .centered()
                .block(block)
                .render(area, buf);
            return;
        }

        // Columns drive the rendering; rows entries without a matching
        // column are ignored, short columns render as empty cells.
        let nrows = self
            .state
            .columns
            .iter()
            .map(|name| self.state.rows.get(name).map_or(0, |data| data.len()))
            .max()
            .unwrap_or(0);

        let widths: Vec<Constraint> = self
            .state
            .columns
            .iter()
            .map(|name| {
                let data = self.state.rows.get(name);
                Constraint::Length(column_width(name, data, self.max_column_width))
            })
            .collect();

        let header = Row::new(self.state.columns.iter().cloned()).bold();
        let rows = (0..nrows).map(|ridx| {
            Row::new(self.state.columns.iter().map(|name| {
                self.state
                    .rows
                    .get(name)
                    .and_then(|data| data.get(ridx))
                    .cloned()
                    .unwrap_or_default()
            }))
        });

        Table::new(rows, widths)
            .header(header)
            .block(block)
            .render(area, buf);
    }
}

// The configured cap is a usize from the CLI; widths beyond what the
// terminal can address saturate at u16::MAX instead of wrapping.
fn column_width(name: &str, data: Option<&Vec<String>>, max_column_width: usize) -> u16 {
    let max_cell = data
        .map(|d| d.iter().map(|s| s.chars().count()).max().unwrap_or(0))
        .unwrap_or(0);
    let width = std::cmp::max(name.chars().count(), max_cell) + COLUMN_WIDTH_MARGIN;
    u16::try_from(std::cmp::min(width, max_column_width)).unwrap_or(u16::MAX)
}
