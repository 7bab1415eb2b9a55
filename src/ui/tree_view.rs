//! Tree widget state mirrored from the outline model.

use std::collections::BTreeSet;

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::outline::{NodePath, Outline};
use crate::target::Target;

const PAGE_COLUMN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub path: NodePath,
    pub title: String,
    pub target: Target,
    pub has_children: bool,
}

impl TreeRow {
    pub fn depth(&self) -> usize {
        self.path.depth()
    }
}

/// Rows, cursor and multi-selection of the bookmark tree.
#[derive(Debug, Default, Clone)]
pub struct TreeViewState {
    rows: Vec<TreeRow>,
    cursor: usize,
    selected: BTreeSet<NodePath>,
}

impl TreeViewState {
    pub fn from_outline(outline: &Outline) -> Self {
        let mut state = Self::default();
        state.refresh(outline, None);
        state
    }

    /// Rebuild rows after the model changed. The cursor moves to `focus` when
    /// given, otherwise it keeps its row index. Selection is dropped since
    /// paths may have shifted.
    pub fn refresh(&mut self, outline: &Outline, focus: Option<&NodePath>) {
        self.rows = outline
            .walk()
            .into_iter()
            .map(|(path, node)| TreeRow {
                path,
                title: node.title.clone(),
                target: node.target,
                has_children: !node.children.is_empty(),
            })
            .collect();
        self.selected.clear();

        if let Some(focus) = focus {
            if let Some(index) = self.rows.iter().position(|row| &row.path == focus) {
                self.cursor = index;
                return;
            }
        }
        self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cursor_row(&self) -> Option<&TreeRow> {
        self.rows.get(self.cursor)
    }

    pub fn cursor_path(&self) -> Option<NodePath> {
        self.cursor_row().map(|row| row.path.clone())
    }

    pub fn select_next(&mut self) {
        if self.cursor + 1 < self.rows.len() {
            self.cursor += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.cursor = 0;
    }

    pub fn select_last(&mut self) {
        self.cursor = self.rows.len().saturating_sub(1);
    }

    pub fn toggle_selected(&mut self) {
        if let Some(path) = self.cursor_path() {
            if !self.selected.remove(&path) {
                self.selected.insert(path);
            }
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.rows.iter().map(|row| row.path.clone()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, path: &NodePath) -> bool {
        self.selected.contains(path)
    }

    pub fn selection_len(&self) -> usize {
        self.selected.len()
    }

    /// The marked rows, or the cursor row when nothing is marked.
    pub fn targets(&self) -> Vec<NodePath> {
        if self.selected.is_empty() {
            self.cursor_path().into_iter().collect()
        } else {
            self.selected.iter().cloned().collect()
        }
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, title: &str, has_focus: bool) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(Style::default().fg(if has_focus {
                Color::Cyan
            } else {
                Color::DarkGray
            }));

        if self.rows.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let placeholder = Paragraph::new("No bookmarks · press a to add one").style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            );
            frame.render_widget(placeholder, inner);
            return;
        }

        // Borders plus the highlight symbol.
        let width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = self
            .rows
            .iter()
            .map(|row| ListItem::new(self.row_line(row, width)))
            .collect();

        let mut list_state = ListState::default();
        list_state.select(Some(self.cursor));

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(if has_focus { Color::Cyan } else { Color::Gray })
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▸ ");

        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn row_line(&self, row: &TreeRow, width: usize) -> Line<'static> {
        let indent = "  ".repeat(row.depth() - 1);
        let marker = if self.is_selected(&row.path) {
            "● "
        } else if row.has_children {
            "▾ "
        } else {
            "• "
        };
        let page = match row.target {
            Target::Unresolved => "—".to_string(),
            target => target.to_string(),
        };

        let used = indent.chars().count() + marker.chars().count() + PAGE_COLUMN;
        let title = truncate(&row.title, width.saturating_sub(used));
        let pad = width
            .saturating_sub(used + title.chars().count())
            .max(1);

        let mut title_style = Style::default();
        if self.is_selected(&row.path) {
            title_style = title_style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
        }
        let page_style = if row.target.is_range() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };

        Line::from(vec![
            Span::raw(indent),
            Span::styled(marker, Style::default().fg(Color::DarkGray)),
            Span::styled(title, title_style),
            Span::raw(" ".repeat(pad)),
            Span::styled(format!("{:>width$}", page, width = PAGE_COLUMN), page_style),
        ])
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::outline::TocEntry;

    fn outline() -> Outline {
        Outline::from_entries(vec![
            TocEntry::new(1, "Preface", Target::Page(1)),
            TocEntry::new(1, "Chapter 1", Target::Page(3)),
            TocEntry::new(2, "Section 1.1", Target::Range { start: 4, end: 6 }),
            TocEntry::new(1, "Index", Target::Page(20)),
        ])
    }

    #[test]
    fn rows_follow_outline_order() {
        let state = TreeViewState::from_outline(&outline());
        let titles: Vec<_> = state.rows().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Preface", "Chapter 1", "Section 1.1", "Index"]);
        assert_eq!(state.rows()[2].depth(), 2);
        assert!(state.rows()[1].has_children);
    }

    #[test]
    fn cursor_moves_within_bounds() {
        let mut state = TreeViewState::from_outline(&outline());
        state.select_previous();
        assert_eq!(state.cursor_path(), Some(NodePath::top(0)));
        state.select_last();
        state.select_next();
        assert_eq!(state.cursor_path(), Some(NodePath::top(2)));
    }

    #[test]
    fn refresh_focuses_path_and_clears_selection() {
        let mut state = TreeViewState::from_outline(&outline());
        state.select_all();
        assert_eq!(state.selection_len(), 4);

        let focus = NodePath::new(vec![1, 0]);
        state.refresh(&outline(), Some(&focus));
        assert_eq!(state.cursor_path(), Some(focus));
        assert_eq!(state.selection_len(), 0);
    }

    #[test]
    fn refresh_clamps_cursor_when_rows_shrink() {
        let mut state = TreeViewState::from_outline(&outline());
        state.select_last();
        state.refresh(&Outline::from_entries(vec![TocEntry::new(1, "Only", Target::Page(1))]), None);
        assert_eq!(state.cursor_path(), Some(NodePath::top(0)));

        state.refresh(&Outline::default(), None);
        assert_eq!(state.cursor_path(), None);
        assert!(state.targets().is_empty());
    }

    #[test]
    fn targets_prefer_selection() {
        let mut state = TreeViewState::from_outline(&outline());
        assert_eq!(state.targets(), vec![NodePath::top(0)]);
        state.select_next();
        state.toggle_selected();
        state.select_last();
        state.toggle_selected();
        assert_eq!(state.targets(), vec![NodePath::top(1), NodePath::top(2)]);
        state.toggle_selected();
        assert_eq!(state.targets(), vec![NodePath::top(1)]);
    }

    #[test]
    fn renders_titles_and_pages() {
        let backend = TestBackend::new(50, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        let state = TreeViewState::from_outline(&outline());

        terminal
            .draw(|frame| {
                let area = frame.size();
                state.render(frame, area, "book.pdf", true);
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content.iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Preface"));
        assert!(text.contains("Section 1.1"));
        assert!(text.contains("4-6"));
        assert!(text.contains("book.pdf"));
    }

    #[test]
    fn truncates_long_titles() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
        assert_eq!(truncate("abc", 0), "");
    }
}
