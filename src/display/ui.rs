use std::io::{self, Write};

use colorful::{Colorful, RGB};

use crate::models::{Community, Statistics};

/// Colour palette shared by every report.
struct Palette {
    primary: RGB,
    success: RGB,
    warning: RGB,
    info: RGB,
    subtle: RGB,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: RGB::new(79, 70, 229),  // Indigo
            success: RGB::new(16, 185, 129), // Emerald
            warning: RGB::new(245, 158, 11), // Amber
            info: RGB::new(59, 130, 246),    // Blue
            subtle: RGB::new(107, 114, 128), // Gray
        }
    }
}

fn metric(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

/// Per-channel validation statistics for one input file.
pub struct Display<'a> {
    pub source: String,
    pub community: &'a Community,
    palette: Palette,
}

impl<'a> Display<'a> {
    pub fn new(source: impl Into<String>, community: &'a Community) -> Self {
        Self {
            source: source.into(),
            community,
            palette: Palette::default(),
        }
    }

    fn channel_label(&self, id: &str) -> String {
        self.community
            .channels
            .iter()
            .find(|c| c.id == id && !c.name.is_empty())
            .map_or_else(|| id.to_string(), |c| format!("#{}", c.name))
    }

    fn write_row(&self, out: &mut impl Write, label: &str, stats: &Statistics) -> io::Result<()> {
        let p = &self.palette;
        let f1 = format!("{:.4}", stats.f1_score);
        let f1 = if label.ends_with("-clustering") { f1.color(p.primary) } else { f1.color(p.success) };
        write!(
            out,
            "     ├─ {:<22} acc {}  prec {}  rec {}  F1 {}",
            label.to_string().color(p.info),
            metric(stats.accuracy).color(p.subtle),
            metric(stats.precision).color(p.subtle),
            metric(stats.recall).color(p.subtle),
            f1
        )?;
        if let Some(times) = &stats.times {
            write!(out, "  ({})", format!("{:.2}s", times.total_time).color(p.warning))?;
        }
        writeln!(out)
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "\n  📊 Validation: {}", self.source.clone().color(self.palette.info))?;
        if self.community.statistics.is_empty() {
            writeln!(out, "     {}", "No statistics".to_string().color(self.palette.subtle))?;
            return Ok(());
        }

        for (channel, table) in &self.community.statistics {
            writeln!(out, "\n  💬 {}", self.channel_label(channel))?;
            for (label, stats) in table {
                self.write_row(out, label, stats)?;
            }
        }
        Ok(())
    }

    pub fn print(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.render(&mut lock)
    }
}

/// One-line summary of a `score` run.
pub fn render_score(out: &mut impl Write, gold: &str, predicted: &str, score: f64) -> io::Result<()> {
    let palette = Palette::default();
    writeln!(
        out,
        "🎯 F-score {} ({} vs {})",
        format!("{score:.4}").color(palette.success),
        gold.to_string().color(palette.subtle),
        predicted.to_string().color(palette.subtle)
    )
}
