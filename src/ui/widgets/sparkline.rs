//! Volume sparkline widget for inline visualization

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Block characters for different volumes (8 levels)
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// A one-row sparkline of traffic volume over time
///
/// When there are more samples than columns, samples are bucketed and each
/// column shows its bucket's peak.
pub struct VolumeSparkline<'a> {
    /// Vehicle counts in time order
    volumes: &'a [f64],
    /// Volume drawn as a full block
    max_volume: f64,
    /// Draw the last column (the most recent samples) in the marker style
    highlight_latest: bool,
    style: Style,
    marker_style: Style,
}

impl<'a> VolumeSparkline<'a> {
    /// Creates a sparkline scaled to the largest value in `volumes`
    pub fn new(volumes: &'a [f64]) -> Self {
        let max_volume = volumes.iter().copied().fold(0.0, f64::max);
        Self {
            volumes,
            max_volume,
            highlight_latest: false,
            style: Style::default().fg(Color::Magenta),
            marker_style: Style::default().fg(Color::Yellow),
        }
    }

    pub fn highlight_latest(mut self) -> Self {
        self.highlight_latest = true;
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn volume_to_block(&self, volume: f64) -> char {
        if self.max_volume <= 0.0 {
            return BLOCKS[0];
        }
        let normalized = (volume / self.max_volume).clamp(0.0, 1.0);
        let index = ((normalized * 7.0).round() as usize).min(7);
        BLOCKS[index]
    }

    /// Peak volume per column for a sparkline `width` columns wide
    fn columns(&self, width: usize) -> Vec<f64> {
        if width == 0 || self.volumes.is_empty() {
            return Vec::new();
        }
        if self.volumes.len() <= width {
            return self.volumes.to_vec();
        }
        let bucket = self.volumes.len().div_ceil(width);
        self.volumes
            .chunks(bucket)
            .map(|chunk| chunk.iter().copied().fold(0.0, f64::max))
            .collect()
    }
}

impl<'a> Widget for VolumeSparkline<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let columns = self.columns(area.width as usize);
        let latest = columns.len().checked_sub(1);

        for (i, volume) in columns.iter().enumerate() {
            let block = self.volume_to_block(*volume);
            let x = area.x + i as u16;
            let y = area.y;

            let style = if self.highlight_latest && latest == Some(i) {
                self.marker_style
            } else {
                self.style
            };

            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char(block).set_style(style);
            }
        }
    }
}
