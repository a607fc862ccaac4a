use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Widget},
};

const SERIES_COLORS: [Color; 6] = [
    Color::Magenta,
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Red,
    Color::Blue,
];

/// Compute X (trial) and Y (seconds) upper bounds for the performance chart
pub fn compute_chart_params(series: &[(String, Vec<(f64, f64)>)]) -> (f64, f64) {
    let points = series.iter().flat_map(|(_, pts)| pts.iter());
    let (max_x, max_y) = points.fold((0.0_f64, 0.0_f64), |(mx, my), &(x, y)| {
        (mx.max(x), my.max(y))
    });

    (max_x.max(1.0), if max_y > 0.0 { max_y * 1.1 } else { 1.0 })
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

/// Average time per trial, one line per participant
pub struct PerformanceChart<'a> {
    series: &'a [(String, Vec<(f64, f64)>)],
}

impl<'a> PerformanceChart<'a> {
    pub fn new(series: &'a [(String, Vec<(f64, f64)>)]) -> Self {
        Self { series }
    }
}

impl Widget for PerformanceChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let (max_trial, max_time) = compute_chart_params(self.series);

        let datasets = self
            .series
            .iter()
            .enumerate()
            .map(|(idx, (name, points))| {
                Dataset::default()
                    .name(name.clone())
                    .marker(Marker::Braille)
                    .style(Style::default().fg(SERIES_COLORS[idx % SERIES_COLORS.len()]))
                    .graph_type(GraphType::Line)
                    .data(points)
            })
            .collect::<Vec<_>>();

        Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Performance"),
            )
            .x_axis(
                Axis::default()
                    .title("Trial #")
                    .bounds([0.0, max_trial])
                    .labels(vec![
                        Span::styled("0", bold_style),
                        Span::styled(format_label(max_trial), bold_style),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("Avg Time")
                    .bounds([0.0, max_time])
                    .labels(vec![
                        Span::styled("0", bold_style),
                        Span::styled(format_label(max_time), bold_style),
                    ]),
            )
            .render(area, buf);
    }
}
