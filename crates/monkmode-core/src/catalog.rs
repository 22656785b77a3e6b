//! Built-in exercise and preset catalog.
//!
//! Presets are ordered compositions of exercises; resolving a preset yields
//! the stage sequence the timer consumes. The catalog is immutable data --
//! the timer never writes back into it.

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::timer::StageDefinition;

/// A single guided exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    /// Target duration in whole seconds.
    pub duration_sec: u64,
    /// Guidance shown while the exercise runs.
    pub reminder_text: String,
}

/// An ordered selection of exercises making up one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub label: String,
    pub description: String,
    pub exercise_ids: Vec<String>,
    pub total_duration_min: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub exercises: Vec<Exercise>,
    pub presets: Vec<Preset>,
}

fn exercise(id: &str, name: &str, duration_sec: u64, reminder_text: &str) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        duration_sec,
        reminder_text: reminder_text.into(),
    }
}

impl Catalog {
    /// The built-in catalog.
    pub fn builtin() -> Self {
        let exercises = vec![
            exercise(
                "breath-awareness",
                "Breath Awareness",
                300,
                "Focus on your natural breath. Notice the air entering and leaving your nostrils.",
            ),
            exercise(
                "body-scan",
                "Body Scan",
                420,
                "Slowly scan your body from head to toe. Release tension as you breathe.",
            ),
            exercise(
                "loving-kindness",
                "Loving Kindness",
                360,
                "Send compassion to yourself and others. May all beings be happy and free.",
            ),
            exercise(
                "mindful-observation",
                "Mindful Observation",
                240,
                "Observe your thoughts without judgment. Let them pass like clouds in the sky.",
            ),
            exercise(
                "gratitude-practice",
                "Gratitude Practice",
                300,
                "Bring to mind three things you are grateful for. Feel the warmth of appreciation.",
            ),
            exercise(
                "sound-meditation",
                "Sound Meditation",
                360,
                "Listen deeply to sounds around you. Notice their quality, distance, and duration.",
            ),
            exercise(
                "visualization",
                "Visualization",
                420,
                "Visualize a peaceful place. Engage all your senses in this safe haven.",
            ),
            exercise(
                "walking-meditation",
                "Walking Meditation",
                480,
                "Feel each step. Notice the sensation of your feet touching the ground.",
            ),
            exercise(
                "open-awareness",
                "Open Awareness",
                600,
                "Rest in pure awareness. Notice whatever arises without attachment.",
            ),
            exercise(
                "heart-center",
                "Heart Center",
                300,
                "Place attention on your heart center. Breathe into this space of compassion.",
            ),
            exercise(
                "counting-breaths",
                "Counting Breaths",
                240,
                "Count each breath from 1 to 10, then start again. Gently return when you lose count.",
            ),
            exercise(
                "noting-practice",
                "Noting Practice",
                360,
                "Silently note sensations, thoughts, and emotions as they arise. \"Thinking\", \"feeling\", \"hearing\".",
            ),
        ];

        let presets = vec![
            Preset {
                id: "beginner".into(),
                label: "Beginner".into(),
                description: "14-minute starter block • 3 exercises".into(),
                exercise_ids: vec![
                    "breath-awareness".into(),
                    "counting-breaths".into(),
                    "gratitude-practice".into(),
                ],
                total_duration_min: 14,
            },
            Preset {
                id: "experienced".into(),
                label: "Experienced".into(),
                description: "30-minute intermediate block • 5 exercises".into(),
                exercise_ids: vec![
                    "breath-awareness".into(),
                    "body-scan".into(),
                    "loving-kindness".into(),
                    "sound-meditation".into(),
                    "noting-practice".into(),
                ],
                total_duration_min: 30,
            },
            Preset {
                id: "advanced".into(),
                label: "Advanced".into(),
                description: "48-minute deep practice • 7 exercises".into(),
                exercise_ids: vec![
                    "breath-awareness".into(),
                    "body-scan".into(),
                    "visualization".into(),
                    "walking-meditation".into(),
                    "heart-center".into(),
                    "open-awareness".into(),
                    "loving-kindness".into(),
                ],
                total_duration_min: 48,
            },
        ];

        Self { exercises, presets }
    }

    pub fn exercise(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn preset(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Resolve a preset into the stage sequence the timer consumes.
    ///
    /// # Errors
    /// Fails on an unknown preset id or a preset referencing an exercise
    /// that does not exist.
    pub fn stages(&self, preset_id: &str) -> Result<Vec<StageDefinition>, CatalogError> {
        let preset = self
            .preset(preset_id)
            .ok_or_else(|| CatalogError::UnknownPreset(preset_id.to_string()))?;
        preset
            .exercise_ids
            .iter()
            .map(|id| {
                let ex = self
                    .exercise(id)
                    .ok_or_else(|| CatalogError::UnknownExercise {
                        preset: preset_id.to_string(),
                        exercise: id.clone(),
                    })?;
                Ok(StageDefinition::new(ex.id.clone(), ex.duration_sec))
            })
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
