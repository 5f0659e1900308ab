//! Events emitted during a simulation step.
//! The presentation layer consumes these for sound; the controller reacts
//! to `GameOver`.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// Scene created (whoosh cue).
    Started,
    Flapped,
    Scored { score: u32 },
    /// Terminal collision. Physics is frozen from here on.
    Hit,
    /// Delayed death cue after a hit.
    Died,
    /// Final score, reported once per scene after the report delay.
    GameOver { score: u32 },
}
