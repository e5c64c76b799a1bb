//! Bridge between the main thread and the background mixer worker.
//!
//! The real mixing backend (device callbacks, decoding) lives outside the
//! core. The worker here is the façade the simulation talks to: it owns
//! the loaded-sound set and channel bookkeeping, services [`AudioCmd`]s,
//! and reports [`AudioMessage`]s back. Commands are enqueued from the main
//! thread only; the worker never touches entities.

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::events::audio::{AudioCmd, AudioMessage};

/// Channels plus the worker's join handle.
pub struct AudioBridge {
    pub tx_cmd: Sender<AudioCmd>,
    pub rx_msg: Receiver<AudioMessage>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl AudioBridge {
    /// Spawn the mixer worker and wire up the channels.
    pub fn setup() -> Self {
        let (tx_cmd, rx_cmd) = unbounded::<AudioCmd>();
        let (tx_msg, rx_msg) = unbounded::<AudioMessage>();
        let handle = std::thread::spawn(move || mixer_thread(rx_cmd, tx_msg));
        Self {
            tx_cmd,
            rx_msg,
            handle: Some(handle),
        }
    }

    /// Enqueue a command. Silently dropped if the worker is gone; audio
    /// loss is never a simulation error.
    pub fn send(&self, cmd: AudioCmd) {
        let _ = self.tx_cmd.send(cmd);
    }

    /// Drain pending messages from the worker.
    pub fn poll(&self) -> Vec<AudioMessage> {
        self.rx_msg.try_iter().collect()
    }

    /// Request shutdown and join the worker.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.tx_cmd.send(AudioCmd::Shutdown);
            let _ = handle.join();
        }
    }
}

impl Drop for AudioBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Mixer worker loop: channel bookkeeping for the external backend.
fn mixer_thread(rx_cmd: Receiver<AudioCmd>, tx_msg: Sender<AudioMessage>) {
    let mut loaded: FxHashSet<String> = FxHashSet::default();
    let mut playing: FxHashMap<u32, String> = FxHashMap::default();
    let mut music: Option<String> = None;
    let mut next_channel: u32 = 1;

    while let Ok(cmd) = rx_cmd.recv() {
        match cmd {
            AudioCmd::LoadSound { id } => {
                loaded.insert(id);
            }
            AudioCmd::UnloadSound { id } => {
                loaded.remove(&id);
            }
            AudioCmd::PlaySound { id } => {
                if loaded.contains(&id) {
                    let channel = next_channel;
                    next_channel = next_channel.wrapping_add(1).max(1);
                    playing.insert(channel, id.clone());
                    let _ = tx_msg.send(AudioMessage::SoundStarted { id, channel });
                } else {
                    let _ = tx_msg.send(AudioMessage::PlayFailed {
                        id,
                        reason: "sound not loaded".into(),
                    });
                }
            }
            AudioCmd::PlayMusic { id, looped: _ } => {
                music = Some(id.clone());
                let _ = tx_msg.send(AudioMessage::MusicStarted { id });
            }
            AudioCmd::StopMusic => {
                if music.take().is_some() {
                    let _ = tx_msg.send(AudioMessage::MusicStopped);
                }
            }
            AudioCmd::FadeOutAll { seconds } => {
                // Bounded by contract; the backend owns the actual ramp.
                debug!("fading out {} channels over {seconds}s", playing.len());
                for (channel, _) in playing.drain() {
                    let _ = tx_msg.send(AudioMessage::SoundFinished { channel });
                }
            }
            AudioCmd::StopAll => {
                for (channel, _) in playing.drain() {
                    let _ = tx_msg.send(AudioMessage::SoundFinished { channel });
                }
                if music.take().is_some() {
                    let _ = tx_msg.send(AudioMessage::MusicStopped);
                }
            }
            AudioCmd::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_after_load_reports_channel() {
        let mut bridge = AudioBridge::setup();
        bridge.send(AudioCmd::LoadSound { id: "hit".into() });
        bridge.send(AudioCmd::PlaySound { id: "hit".into() });
        bridge.send(AudioCmd::Shutdown);
        // Join first so all messages are flushed.
        bridge.shutdown();
        let msgs = bridge.poll();
        assert!(matches!(
            msgs.as_slice(),
            [AudioMessage::SoundStarted { channel, .. }] if *channel >= 1
        ));
    }

    #[test]
    fn play_unloaded_fails() {
        let mut bridge = AudioBridge::setup();
        bridge.send(AudioCmd::PlaySound { id: "nope".into() });
        bridge.shutdown();
        let msgs = bridge.poll();
        assert!(matches!(msgs.as_slice(), [AudioMessage::PlayFailed { .. }]));
    }

    #[test]
    fn stop_all_finishes_channels() {
        let mut bridge = AudioBridge::setup();
        bridge.send(AudioCmd::LoadSound { id: "a".into() });
        bridge.send(AudioCmd::PlaySound { id: "a".into() });
        bridge.send(AudioCmd::StopAll);
        bridge.shutdown();
        let msgs = bridge.poll();
        assert!(
            msgs.iter()
                .any(|m| matches!(m, AudioMessage::SoundFinished { .. }))
        );
    }
}
