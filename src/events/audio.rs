//! Commands and messages for the background mixer worker.

/// Commands sent *to* the mixer worker.
#[derive(Debug, Clone)]
pub enum AudioCmd {
    LoadSound { id: String },
    UnloadSound { id: String },
    PlaySound { id: String },
    PlayMusic { id: String, looped: bool },
    StopMusic,
    /// Fade every playing channel out within `seconds`; used on scene
    /// change so nothing rings across the load.
    FadeOutAll { seconds: f32 },
    StopAll,
    Shutdown,
}

/// Messages sent *back* from the mixer worker.
#[derive(Debug, Clone)]
pub enum AudioMessage {
    SoundStarted { id: String, channel: u32 },
    SoundFinished { channel: u32 },
    MusicStarted { id: String },
    MusicStopped,
    PlayFailed { id: String, reason: String },
}
