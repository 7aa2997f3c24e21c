//! Line protocol spoken over the synthesizer's stdin/stdout.
//!
//! Requests are ASCII lines; responses are raw audio. The conversation is:
//!
//! 1. handshake: send `"#\n"`, receive a 44-byte WAV header
//! 2. per phoneme: send `"<symbol> <duration>[ <pos> <pitch>]*\n"`
//! 3. per utterance: send `"\n#\n"`, receive s16le samples until the
//!    process goes quiet

use std::fmt::Write as _;

use crate::envelope::Envelope;
use crate::error::{SynthError, SynthResult};
use crate::voice::PhonemeEntry;

/// Handshake request.
pub const HANDSHAKE: &[u8] = b"#\n";

/// Utterance flush marker.
pub const FLUSH: &[u8] = b"\n#\n";

/// Size of the handshake response.
pub const WAV_HEADER_LEN: usize = 44;

const RIFF_TAG: &[u8; 4] = b"RIFF";
const WAVE_FMT_TAG: &[u8; 8] = b"WAVEfmt ";
const SAMPLE_RATE_OFFSET: usize = 24;
const CHANNELS_OFFSET: usize = 22;
const BITS_PER_SAMPLE_OFFSET: usize = 34;

/// One encoded phoneme command plus the pitch to carry into the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedCommand {
    /// Newline-terminated command text.
    pub line: String,
    /// Base pitch for the next phoneme. Unchanged unless the envelope was
    /// applied, in which case it is the pitch at the contour's last point.
    pub carried_pitch: f32,
}

/// Check that a symbol can travel as the first field of a command line.
pub fn validate_symbol(symbol: &str) -> SynthResult<()> {
    if symbol.is_empty()
        || symbol.starts_with(['#', ';'])
        || symbol.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(SynthError::InvalidPhoneme(symbol.to_string()));
    }
    Ok(())
}

/// Encode one phoneme command.
///
/// Pitch at each contour point is `pitch * variation / 100`. Contour pairs
/// are emitted only when `entry.has_envelope` is set.
pub fn encode_command(
    symbol: &str,
    entry: PhonemeEntry,
    pitch: f32,
    envelope: &Envelope,
) -> EncodedCommand {
    let pairs = if entry.has_envelope { envelope.len() } else { 0 };
    let mut line = String::with_capacity(symbol.len() + 12 + pairs * 20);

    line.push_str(symbol);
    line.push(' ');
    line.push_str(&format_number(entry.duration));

    if !entry.has_envelope {
        line.push('\n');
        return EncodedCommand {
            line,
            carried_pitch: pitch,
        };
    }

    for point in envelope.points() {
        // Writing into a String cannot fail.
        let _ = write!(
            line,
            " {} {}",
            format_number(point.position),
            format_number(scale_pitch(pitch, point.pitch_variation))
        );
    }
    let carried_pitch = scale_pitch(pitch, envelope.last().pitch_variation);

    line.push('\n');
    EncodedCommand {
        line,
        carried_pitch,
    }
}

/// `pitch * variation / 100`, computed wide so that 100% is exact.
#[allow(clippy::cast_possible_truncation)]
fn scale_pitch(pitch: f32, variation: f32) -> f32 {
    (f64::from(pitch) * f64::from(variation) / 100.0) as f32
}

/// Format like C's `%g`: six significant digits, trailing zeros trimmed,
/// exponent notation below 1e-4 or from 1e6 upwards.
pub fn format_number(value: f32) -> String {
    const PRECISION: i32 = 6;

    let value = f64::from(value);
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }

    // Round to the target precision first so the exponent reflects carries
    // (e.g. 999999.5 -> 1e+06).
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= PRECISION {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    } else {
        let decimals = (PRECISION - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Audio parameters announced by the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl WavHeader {
    /// Validate a handshake response and extract its parameters.
    ///
    /// Requires the full 44 bytes, `RIFF` at offset 0 and `WAVEfmt ` at
    /// offset 8. The sample rate is the little-endian `u32` at offset 24.
    pub fn parse(bytes: &[u8]) -> SynthResult<Self> {
        if bytes.len() < WAV_HEADER_LEN {
            return Err(SynthError::Init(format!(
                "short WAV header: got {} of {WAV_HEADER_LEN} bytes",
                bytes.len()
            )));
        }
        if &bytes[0..4] != RIFF_TAG || &bytes[8..16] != WAVE_FMT_TAG {
            return Err(SynthError::init("response is not a WAV header"));
        }

        let sample_rate = u32::from_le_bytes([
            bytes[SAMPLE_RATE_OFFSET],
            bytes[SAMPLE_RATE_OFFSET + 1],
            bytes[SAMPLE_RATE_OFFSET + 2],
            bytes[SAMPLE_RATE_OFFSET + 3],
        ]);
        let channels = u16::from_le_bytes([bytes[CHANNELS_OFFSET], bytes[CHANNELS_OFFSET + 1]]);
        let bits_per_sample = u16::from_le_bytes([
            bytes[BITS_PER_SAMPLE_OFFSET],
            bytes[BITS_PER_SAMPLE_OFFSET + 1],
        ]);

        Ok(Self {
            sample_rate,
            channels,
            bits_per_sample,
        })
    }

    /// Build the minimal mono s16le header for `sample_rate` with an
    /// unknown (zero) data length.
    pub fn minimal(sample_rate: u32) -> [u8; WAV_HEADER_LEN] {
        let mut header = [0u8; WAV_HEADER_LEN];
        header[0..4].copy_from_slice(RIFF_TAG);
        header[4..8].copy_from_slice(&36u32.to_le_bytes());
        header[8..16].copy_from_slice(WAVE_FMT_TAG);
        header[16..20].copy_from_slice(&16u32.to_le_bytes());
        header[20..22].copy_from_slice(&1u16.to_le_bytes());
        header[22..24].copy_from_slice(&1u16.to_le_bytes());
        header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
        header[28..32].copy_from_slice(&sample_rate.saturating_mul(2).to_le_bytes());
        header[32..34].copy_from_slice(&2u16.to_le_bytes());
        header[34..36].copy_from_slice(&16u16.to_le_bytes());
        header[36..40].copy_from_slice(b"data");
        header
    }
}
