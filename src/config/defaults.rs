//! Default values shared by the CLI definition and validation.

/// Capture and recognition sample rate (Hz). Whisper models are trained on
/// 16 kHz mono audio, so this is also the rate requested from the device.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Window duration accumulated before each transcription pass (milliseconds).
pub const DEFAULT_WINDOW_MS: u64 = 2_000;

/// Frame channel capacity between the audio callback and the processing loop.
/// Sized so frames keep queueing while a slow transcription pass runs.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 512;

/// Whisper beam size (>1 enables beam search).
pub const DEFAULT_BEAM_SIZE: u32 = 3;

/// Whisper sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Language hint passed to Whisper. "auto" enables detection.
pub const DEFAULT_LANG: &str = "ja";

/// Every two-letter ISO-639-1 code Whisper can be hinted with.
pub const ISO_639_1_CODES: &[&str] = &[
    "aa", "ab", "ae", "af", "ak", "am", "an", "ar", "as", "av", "ay", "az", "ba", "be", "bg", "bh",
    "bi", "bm", "bn", "bo", "br", "bs", "ca", "ce", "ch", "co", "cr", "cs", "cu", "cv", "cy", "da",
    "de", "dv", "dz", "ee", "el", "en", "eo", "es", "et", "eu", "fa", "ff", "fi", "fj", "fo", "fr",
    "fy", "ga", "gd", "gl", "gn", "gu", "gv", "ha", "he", "hi", "ho", "hr", "ht", "hu", "hy", "hz",
    "ia", "id", "ie", "ig", "ii", "ik", "io", "is", "it", "iu", "ja", "jv", "ka", "kg", "ki", "kj",
    "kk", "kl", "km", "kn", "ko", "kr", "ks", "ku", "kv", "kw", "ky", "la", "lb", "lg", "li", "ln",
    "lo", "lt", "lu", "lv", "mg", "mh", "mi", "mk", "ml", "mn", "mr", "ms", "mt", "my", "na", "nb",
    "nd", "ne", "ng", "nl", "nn", "no", "nr", "nv", "ny", "oc", "oj", "om", "or", "os", "pa", "pi",
    "pl", "ps", "pt", "qu", "rm", "rn", "ro", "ru", "rw", "sa", "sc", "sd", "se", "sg", "si", "sk",
    "sl", "sm", "sn", "so", "sq", "sr", "ss", "st", "su", "sv", "sw", "ta", "te", "tg", "th", "ti",
    "tk", "tl", "tn", "to", "tr", "ts", "tt", "tw", "ty", "ug", "uk", "ur", "uz", "ve", "vi", "vo",
    "wa", "wo", "xh", "yi", "yo", "za", "zh", "zu",
];
