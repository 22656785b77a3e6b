use clap::Subcommand;
use monkmode_core::Catalog;

#[derive(Subcommand)]
pub enum PresetAction {
    /// List available presets
    List,
    /// Show a preset with its exercises
    Show {
        /// Preset id
        id: String,
    },
}

pub fn run(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::builtin();
    match action {
        PresetAction::List => {
            println!("{}", serde_json::to_string_pretty(&catalog.presets)?);
        }
        PresetAction::Show { id } => {
            let preset = catalog
                .preset(&id)
                .ok_or_else(|| format!("unknown preset: {id}"))?;
            let exercises: Vec<_> = preset
                .exercise_ids
                .iter()
                .filter_map(|eid| catalog.exercise(eid))
                .collect();
            let detail = serde_json::json!({
                "preset": preset,
                "exercises": exercises,
            });
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
    }
    Ok(())
}
