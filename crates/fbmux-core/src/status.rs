//! The one-line tag and status bar.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use fbmux_vt::Rgb;

use crate::canvas::{Canvas, Pen};
use crate::mux::Mux;
use crate::session::Session;
const LABEL: &str = "TAGS: ";
const FG: Rgb = Rgb::from_u32(0x96cb5c);
const BG: Rgb = Rgb::from_u32(0x516f7b);
/// Tag colors by number of open sessions.
const OCCUPANCY: [Rgb; 3] = [Rgb::from_u32(0x173f4f), FG, Rgb::from_u32(0x68cbc0)];
/// Most status characters shown at the right end.
const STATUS_WIDTH: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarState {
    /// No status source; the bar is only drawn on request.
    Disabled,
    Hidden,
    Shown,
}

/// Bar visibility and the last status line read.
#[derive(Debug)]
pub struct StatusBar {
    state: BarState,
    text: String,
    source: Option<PathBuf>,
}

impl StatusBar {
    /// A bar reading `source`; starts hidden, or disabled without a source.
    pub fn new(source: Option<PathBuf>) -> Self {
        let state = if source.is_some() {
            BarState::Hidden
        } else {
            BarState::Disabled
        };
        Self {
            state,
            text: String::new(),
            source,
        }
    }

    pub fn state(&self) -> BarState {
        self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Re-read the first line of the status source.
    ///
    /// Keeps the previous text when the source cannot be read or is empty.
    pub fn refresh(&mut self) -> bool {
        let Some(path) = self.source.as_ref() else {
            return false;
        };
        match read_first_line(path) {
            Ok(Some(line)) => {
                self.text = line;
                true
            }
            Ok(None) => false,
            Err(e) => {
                log::debug!("status source {}: {e}", path.display());
                false
            }
        }
    }

    /// Flip between shown and hidden. A disabled bar stays disabled.
    fn toggle(&mut self) -> BarState {
        self.state = match self.state {
            BarState::Disabled => BarState::Disabled,
            BarState::Hidden => BarState::Shown,
            BarState::Shown => BarState::Hidden,
        };
        self.state
    }
}

fn read_first_line(path: &Path) -> io::Result<Option<String>> {
    let mut line = String::new();
    let n = BufReader::new(File::open(path)?).read_line(&mut line)?;
    if n == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
        line.push(' ');
    }
    Ok(Some(line))
}

/// One tag as the bar shows it.
#[derive(Clone, Copy, Debug)]
pub struct TagCell {
    pub symbol: char,
    /// Open sessions in the tag, 0..=2.
    pub open: usize,
    pub saved: bool,
}

/// Lay out the bar for a row of `cols` cells.
///
/// Tags are listed after the label until they would run into the status
/// text, which takes the right end.
pub fn status_cells(tags: &[TagCell], current: usize, status: &str, cols: usize) -> Vec<(char, Pen)> {
    let plain = Pen::new(FG, BG);
    let strong = plain.bold();
    let status: Vec<char> = status.chars().take(STATUS_WIDTH).collect();
    let limit = cols.saturating_sub(status.len());

    let mut cells: Vec<(char, Pen)> = LABEL.chars().map(|c| (c, strong)).collect();
    for (i, tag) in tags.iter().enumerate() {
        if cells.len() + 2 >= limit {
            break;
        }
        let nt = tag.open.min(2);
        let mut pen = if tag.saved {
            Pen::new(if nt == 0 { BG } else { OCCUPANCY[nt] }, OCCUPANCY[0])
        } else {
            Pen::new(OCCUPANCY[nt], BG)
        };
        if nt == 2 {
            pen = pen.bold();
        }
        let (open, close) = if i == current { ('(', ')') } else { (' ', ' ') };
        cells.push((open, plain));
        cells.push((tag.symbol, pen));
        cells.push((close, plain));
    }
    while cells.len() < limit {
        cells.push((' ', plain));
    }
    cells.extend(status.into_iter().map(|c| (c, strong)));
    cells.truncate(cols);
    cells
}

impl<S: Session, C: Canvas> Mux<S, C> {
    fn tag_cells(&self) -> Vec<TagCell> {
        (0..self.slots.tag_count())
            .map(|tag| TagCell {
                symbol: self.config.tag_symbol(tag),
                open: self.slots.open_count(tag),
                saved: self.config.is_saved(tag),
            })
            .collect()
    }

    /// Paint the bar on the last row of the current slot's region.
    pub fn draw_status(&mut self) {
        if self.state.display_suspended {
            return;
        }
        let region = self.region_of(self.current_slot());
        let Some(row) = region.rows.checked_sub(1) else {
            return;
        };
        let cells = status_cells(&self.tag_cells(), self.state.current_tag, self.bar.text(), region.cols);
        for (col, (ch, pen)) in cells.into_iter().enumerate() {
            self.canvas.put(&region, row, col, ch, pen);
        }
    }

    /// Repaint the bar if it is shown.
    pub(crate) fn repaint_status(&mut self) {
        if self.bar.state == BarState::Shown {
            self.draw_status();
        }
    }

    /// Show or hide the bar. Hiding repaints the current slot over it.
    pub fn toggle_bar(&mut self) {
        match self.bar.toggle() {
            BarState::Hidden => self.redraw_current(),
            BarState::Shown | BarState::Disabled => self.draw_status(),
        }
    }

    /// Re-read the status source and repaint the bar if it is shown.
    pub fn refresh_status(&mut self) {
        if self.bar.refresh() {
            self.repaint_status();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MuxConfig;
    use crate::mux::tests::{mux, mux_with, open};
    use crate::slots::Instance;
    use std::io::Write;

    fn tag(symbol: char, open: usize, saved: bool) -> TagCell {
        TagCell { symbol, open, saved }
    }

    fn text(cells: &[(char, Pen)]) -> String {
        cells.iter().map(|(c, _)| *c).collect()
    }

    #[test]
    fn test_cells_mark_current_tag() {
        let tags = [tag('a', 0, false), tag('b', 1, false), tag('c', 2, true)];
        let cells = status_cells(&tags, 1, "up 3d", 30);
        assert_eq!(text(&cells), "TAGS:  a (b) c           up 3d");
        assert_eq!(cells.len(), 30);

        assert_eq!(cells[7].1, Pen::new(OCCUPANCY[0], BG));
        assert_eq!(cells[10].1, Pen::new(OCCUPANCY[1], BG));
        assert_eq!(cells[13].1, Pen::new(OCCUPANCY[2], OCCUPANCY[0]).bold());
    }

    #[test]
    fn test_saved_empty_tag_is_dim() {
        let cells = status_cells(&[tag('z', 0, true)], 5, "", 12);
        assert_eq!(cells[7].1, Pen::new(BG, OCCUPANCY[0]));
    }

    #[test]
    fn test_status_text_is_truncated() {
        let long = "x".repeat(50);
        let cells = status_cells(&[tag('a', 0, false)], 0, &long, 80);
        assert_eq!(cells.len(), 80);
        assert_eq!(text(&cells[48..]), "x".repeat(32));
    }

    #[test]
    fn test_tags_stop_before_status() {
        let tags: Vec<_> = "abcdefgh".chars().map(|c| tag(c, 0, false)).collect();
        let cells = status_cells(&tags, 0, "0123456789", 24);
        assert_eq!(text(&cells), "TAGS: (a) b   0123456789");
        assert_eq!(cells.len(), 24);
    }

    #[test]
    fn test_refresh_keeps_last_text() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "load 0.42").unwrap();
        writeln!(file, "ignored").unwrap();
        let mut bar = StatusBar::new(Some(file.path().to_path_buf()));
        assert_eq!(bar.state(), BarState::Hidden);
        assert!(bar.refresh());
        assert_eq!(bar.text(), "load 0.42 ");

        file.as_file().set_len(0).unwrap();
        assert!(!bar.refresh());
        assert_eq!(bar.text(), "load 0.42 ");

        let path = file.path().to_path_buf();
        drop(file);
        let mut gone = StatusBar::new(Some(path));
        assert!(!gone.refresh());
        assert_eq!(gone.text(), "");
    }

    #[test]
    fn test_toggle_draws_and_hides() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = MuxConfig {
            status_file: Some(file.path().to_path_buf()),
            ..crate::mux::tests::config()
        };
        let mut mux = mux_with(config);
        // start() shows the bar.
        assert_eq!(mux.bar().state(), BarState::Shown);
        let current = mux.current_slot();
        let region = mux.region_of(current);
        assert!(mux.canvas().row_text(&region, region.rows - 1).starts_with("TAGS: (a)"));

        open(&mut mux, 0, Instance::Main);
        mux.toggle_bar();
        assert_eq!(mux.bar().state(), BarState::Hidden);
        assert_eq!(mux.slots()[current].redraws().last(), Some(&true));
    }

    #[test]
    fn test_disabled_bar_draws_on_request() {
        let mut mux = mux();
        assert_eq!(mux.bar().state(), BarState::Disabled);
        mux.toggle_bar();
        assert_eq!(mux.bar().state(), BarState::Disabled);
        let region = mux.region_of(mux.current_slot());
        assert!(mux.canvas().row_text(&region, region.rows - 1).starts_with("TAGS:"));
    }
}
