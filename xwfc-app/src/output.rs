use crate::error::AppError;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use xwfc_core::{EntanglementRules, GridTopology, WaveFunctionSystem};
use xwfc_rules::ModuleSet;

/// Writes a fully resolved grid as text.
///
/// Format: one line per grid row, northernmost row first, module names
/// separated by single spaces.
pub fn write_grid<R: EntanglementRules, W: Write>(
    system: &WaveFunctionSystem<GridTopology, R>,
    modules: &ModuleSet,
    mut writer: W,
) -> Result<(), AppError> {
    let grid = system.topology();
    for y in (0..grid.height).rev() {
        let mut names = Vec::with_capacity(grid.width);
        for x in 0..grid.width {
            let wave = grid
                .index_of(x, y)
                .and_then(|index| system.variable_of(index))
                .and_then(|variable| system.wave(variable));
            let state = wave.and_then(|wave| wave.resolved_state()).ok_or_else(|| {
                AppError::Unresolved {
                    x,
                    y,
                    candidates: wave.map_or(0, |wave| wave.popcount()),
                }
            })?;
            names.push(
                modules
                    .name_of(state)
                    .map_or_else(|| format!("#{state}"), str::to_owned),
            );
        }
        writeln!(writer, "{}", names.join(" "))?;
    }
    Ok(())
}

/// Saves the final collapsed grid to a file in the text format of [`write_grid`].
pub fn save_grid_to_file<R: EntanglementRules>(
    system: &WaveFunctionSystem<GridTopology, R>,
    modules: &ModuleSet,
    output_path: &Path,
) -> Result<(), AppError> {
    info!("Attempting to save grid to {:?}...", output_path);
    let mut writer = BufWriter::new(File::create(output_path)?);
    write_grid(system, modules, &mut writer)?;
    writer.flush()?;
    info!("Successfully saved grid to {:?}", output_path);
    Ok(())
}

/// Saves every wave state as JSON, resolved or not.
pub fn save_snapshot<R: EntanglementRules>(
    system: &WaveFunctionSystem<GridTopology, R>,
    path: &Path,
) -> Result<(), AppError> {
    let mut writer = BufWriter::new(File::create(path)?);
    system
        .write_snapshot(&mut writer)
        .map_err(|e| AppError::Snapshot(e.to_string()))?;
    writer.flush()?;
    info!("Saved wave snapshot to {:?}", path);
    Ok(())
}
