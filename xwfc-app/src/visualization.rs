use crate::error::AppError;
use colored::{Color, Colorize};
use std::io::Write;
use xwfc_core::{EntanglementRules, GridTopology, SuperposedState, WaveFunctionSystem};
use xwfc_rules::ModuleSet;

const GLYPHS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const PALETTE: [Color; 12] = [
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::BrightRed,
    Color::BrightGreen,
    Color::BrightYellow,
    Color::BrightBlue,
    Color::BrightMagenta,
    Color::BrightCyan,
];

/// Trait for types that can visualize the state of a grid system.
///
/// Implementors define how the current waves (resolved modules, remaining
/// candidates, contradictions) are presented to the user.
pub trait Visualizer {
    /// Displays or updates the visualization based on the current state of the system.
    fn display_state<R: EntanglementRules>(
        &mut self,
        system: &WaveFunctionSystem<GridTopology, R>,
    ) -> Result<(), AppError>;
}

/// Renders the grid as text, one character per cell.
///
/// Resolved cells show their module's glyph (listed in the legend), cells
/// with several candidates show `.`, empty cells show `!`.
pub struct TerminalVisualizer<W: Write> {
    writer: W,
    glyphs: Vec<(usize, char, String)>,
    use_color: bool,
    frames: usize,
}

impl<W: Write> TerminalVisualizer<W> {
    pub fn new(writer: W, modules: &ModuleSet, use_color: bool) -> Self {
        let glyphs = modules
            .modules()
            .iter()
            .enumerate()
            .map(|(index, module)| {
                let glyph = GLYPHS.get(index).map_or('*', |&byte| char::from(byte));
                (module.state.0, glyph, module.name.clone())
            })
            .collect();
        Self {
            writer,
            glyphs,
            use_color,
            frames: 0,
        }
    }

    /// Frames displayed so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// `glyph=name` pairs in declaration order.
    pub fn legend(&self) -> String {
        self.glyphs
            .iter()
            .map(|(_, glyph, name)| format!("{glyph}={name}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn paint(&self, text: char, color: Color) -> String {
        if self.use_color {
            text.to_string().color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn cell(&self, wave: Option<&SuperposedState>) -> String {
        let Some(wave) = wave.filter(|wave| !wave.is_empty()) else {
            return self.paint('!', Color::BrightRed);
        };
        let Some(state) = wave.resolved_state() else {
            return self.paint('.', Color::BrightBlack);
        };
        match self
            .glyphs
            .iter()
            .position(|(candidate, _, _)| *candidate == state.0)
        {
            Some(index) => self.paint(self.glyphs[index].1, PALETTE[index % PALETTE.len()]),
            None => self.paint('?', Color::White),
        }
    }

    /// The grid as text, northernmost row first.
    pub fn render<R: EntanglementRules>(
        &self,
        system: &WaveFunctionSystem<GridTopology, R>,
    ) -> String {
        let grid = system.topology();
        let mut out = String::with_capacity((grid.width + 1) * grid.height);
        for y in (0..grid.height).rev() {
            for x in 0..grid.width {
                let wave = grid
                    .index_of(x, y)
                    .and_then(|index| system.variable_of(index))
                    .and_then(|variable| system.wave(variable));
                out.push_str(&self.cell(wave));
            }
            out.push('\n');
        }
        out
    }
}

impl<W: Write> Visualizer for TerminalVisualizer<W> {
    fn display_state<R: EntanglementRules>(
        &mut self,
        system: &WaveFunctionSystem<GridTopology, R>,
    ) -> Result<(), AppError> {
        if self.frames == 0 {
            writeln!(self.writer, "Legend: {}", self.legend())?;
        }
        let frame = self.render(system);
        writeln!(
            self.writer,
            "--- Frame {} ({}/{} resolved) ---",
            self.frames,
            system.resolved_count(),
            system.variable_count()
        )?;
        self.writer.write_all(frame.as_bytes())?;
        self.writer.flush()?;
        self.frames += 1;
        Ok(())
    }
}
