pub mod backend;
pub mod file;
pub mod pcm;
pub mod playback;
pub mod wav_sink;

pub use backend::{AudioFrame, AudioTrack, CaptureConfig};
pub use file::{AudioFile, FileAudioTrack};
pub use pcm::{
    decode_base64_pcm16, decode_pcm16, encode_pcm16, AudioBuffer, INPUT_SAMPLE_RATE,
    OUTPUT_SAMPLE_RATE,
};
pub use playback::{AudioSink, MonotonicClock, PlaybackClock, PlaybackScheduler, ScheduledBuffer};
pub use wav_sink::WavSink;
