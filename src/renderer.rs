//! Rendering sinks
//!
//! The overlay does not draw anything itself. Each frame it hands a sink:
//! - the gradient stops, whenever they changed
//! - one sprite per star, in paint order (far to near)
//! - the glow circle
//!
//! Two sinks ship with the preview: a log summary and JSON lines.

use crate::color::Rgb;
use crate::glow::{GlowState, GradientStop};
use crate::starfield::Star;
use log::{debug, info};
use serde::Serialize;
use std::io::{self, Write};

/// Draw parameters of one star
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StarSprite {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: Rgb,
    pub opacity: f32,
}

impl From<&Star> for StarSprite {
    fn from(star: &Star) -> Self {
        Self {
            x: star.position.x,
            y: star.position.y,
            radius: star.size,
            color: star.color,
            opacity: star.opacity,
        }
    }
}

/// Draw parameters of the glow circle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlowCircle {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    pub blur: f32,
    pub opacity: f32,
}

impl From<&GlowState> for GlowCircle {
    fn from(glow: &GlowState) -> Self {
        Self {
            cx: glow.center.x,
            cy: glow.center.y,
            radius: glow.radius,
            blur: glow.blur,
            opacity: glow.opacity,
        }
    }
}

/// Receives the draw calls of one frame
pub trait RenderSink {
    fn begin_frame(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Radial gradient for the glow: stops at 0%, 30%, 60% and 100%
    fn gradient(&mut self, stops: &[GradientStop; 4]) -> io::Result<()>;

    fn star(&mut self, star: &StarSprite) -> io::Result<()>;

    fn glow(&mut self, glow: &GlowCircle) -> io::Result<()>;

    fn end_frame(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Logs a one-line summary per frame at debug level, and at info level every `every` frames
pub struct LogSink {
    every: u64,
    frame: u64,
    stars: usize,
    opacity_sum: f32,
    glow: Option<GlowCircle>,
}

impl LogSink {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            frame: 0,
            stars: 0,
            opacity_sum: 0.0,
            glow: None,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frame
    }

    fn summary(&self) -> String {
        let mean = if self.stars > 0 {
            self.opacity_sum / self.stars as f32
        } else {
            0.0
        };
        match self.glow {
            Some(g) => format!(
                "frame {}: {} stars (mean opacity {:.2}), glow r={:.0} blur={:.1} opacity={:.2}",
                self.frame, self.stars, mean, g.radius, g.blur, g.opacity
            ),
            None => format!(
                "frame {}: {} stars (mean opacity {:.2}), no glow",
                self.frame, self.stars, mean
            ),
        }
    }
}

impl RenderSink for LogSink {
    fn begin_frame(&mut self) -> io::Result<()> {
        self.stars = 0;
        self.opacity_sum = 0.0;
        self.glow = None;
        Ok(())
    }

    fn gradient(&mut self, stops: &[GradientStop; 4]) -> io::Result<()> {
        let colors: Vec<String> = stops
            .iter()
            .map(|s| format!("{:.0}% {}", s.offset * 100.0, s.color))
            .collect();
        info!("Glow gradient: {}", colors.join(", "));
        Ok(())
    }

    fn star(&mut self, star: &StarSprite) -> io::Result<()> {
        self.stars += 1;
        self.opacity_sum += star.opacity;
        Ok(())
    }

    fn glow(&mut self, glow: &GlowCircle) -> io::Result<()> {
        self.glow = Some(*glow);
        Ok(())
    }

    fn end_frame(&mut self) -> io::Result<()> {
        self.frame += 1;
        if self.frame % self.every == 0 {
            info!("{}", self.summary());
        } else {
            debug!("{}", self.summary());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Frame<'a> {
    frame: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    gradient: Option<&'a [GradientStop; 4]>,
    stars: &'a [StarSprite],
    glow: Option<&'a GlowCircle>,
}

/// Writes one JSON object per frame, newline separated
pub struct JsonLinesSink<W: Write> {
    out: W,
    frame: u64,
    gradient: Option<[GradientStop; 4]>,
    stars: Vec<StarSprite>,
    glow: Option<GlowCircle>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            frame: 0,
            gradient: None,
            stars: Vec::new(),
            glow: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSink for JsonLinesSink<W> {
    fn begin_frame(&mut self) -> io::Result<()> {
        self.gradient = None;
        self.stars.clear();
        self.glow = None;
        Ok(())
    }

    fn gradient(&mut self, stops: &[GradientStop; 4]) -> io::Result<()> {
        self.gradient = Some(*stops);
        Ok(())
    }

    fn star(&mut self, star: &StarSprite) -> io::Result<()> {
        self.stars.push(*star);
        Ok(())
    }

    fn glow(&mut self, glow: &GlowCircle) -> io::Result<()> {
        self.glow = Some(*glow);
        Ok(())
    }

    fn end_frame(&mut self) -> io::Result<()> {
        let frame = Frame {
            frame: self.frame,
            gradient: self.gradient.as_ref(),
            stars: &self.stars,
            glow: self.glow.as_ref(),
        };
        serde_json::to_writer(&mut self.out, &frame)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        self.frame += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::config::ColorStops;
    use crate::glow::gradient;
    use glam::Vec2;

    fn sprite(opacity: f32) -> StarSprite {
        StarSprite {
            x: 10.0,
            y: 20.0,
            radius: 1.5,
            color: Rgb { r: 102, g: 122, b: 153 },
            opacity,
        }
    }

    fn circle() -> GlowCircle {
        GlowCircle::from(&GlowState {
            center: Vec2::new(50.0, 40.0),
            radius: 239.0,
            blur: 23.9,
            opacity: 1.0,
        })
    }

    #[test]
    fn json_lines_one_object_per_frame() {
        let mut sink = JsonLinesSink::new(Vec::new());

        sink.begin_frame().unwrap();
        sink.gradient(&gradient(&ColorStops::default())).unwrap();
        sink.star(&sprite(0.5)).unwrap();
        sink.star(&sprite(0.75)).unwrap();
        sink.glow(&circle()).unwrap();
        sink.end_frame().unwrap();

        sink.begin_frame().unwrap();
        sink.glow(&circle()).unwrap();
        sink.end_frame().unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);

        let first = &lines[0];
        assert_eq!(first["frame"], 0);
        assert_eq!(first["stars"].as_array().unwrap().len(), 2);
        assert_eq!(first["stars"][0]["color"]["b"], 153);
        assert_eq!(first["stars"][1]["opacity"], 0.75);
        assert_eq!(first["gradient"][1]["offset"].as_f64().unwrap() as f32, 0.3);
        assert_eq!(first["gradient"][0]["color"]["r"], 120);
        assert_eq!(first["glow"]["cx"], 50.0);
        assert_eq!(first["glow"]["radius"], 239.0);

        let second = &lines[1];
        assert_eq!(second["frame"], 1);
        assert!(second.get("gradient").is_none());
        assert!(second["stars"].as_array().unwrap().is_empty());
    }

    #[test]
    fn log_sink_counts_frames() {
        let mut sink = LogSink::new(0);
        sink.gradient(&gradient(&ColorStops {
            fade: Rgba::new(0, 0, 0, 0.0),
            ..Default::default()
        }))
        .unwrap();
        for _ in 0..3 {
            sink.begin_frame().unwrap();
            sink.star(&sprite(0.4)).unwrap();
            sink.star(&sprite(0.8)).unwrap();
            sink.glow(&circle()).unwrap();
            sink.end_frame().unwrap();
        }
        assert_eq!(sink.frames(), 3);
        assert_eq!(
            sink.summary(),
            "frame 3: 2 stars (mean opacity 0.60), glow r=239 blur=23.9 opacity=1.00"
        );
    }
}
