//! General MIDI instrument names and the `%%MIDI program` directive.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::document::Document;
use crate::error::{ModeError, Result};

/// The 128 General MIDI program names, indexed by program number.
pub const GM_PROGRAMS: [&str; 128] = [
    // Piano
    "Acoustic Grand Piano",
    "Bright Acoustic Piano",
    "Electric Grand Piano",
    "Honky-tonk Piano",
    "Electric Piano 1",
    "Electric Piano 2",
    "Harpsichord",
    "Clavinet",
    // Chromatic percussion
    "Celesta",
    "Glockenspiel",
    "Music Box",
    "Vibraphone",
    "Marimba",
    "Xylophone",
    "Tubular Bells",
    "Dulcimer",
    // Organ
    "Drawbar Organ",
    "Percussive Organ",
    "Rock Organ",
    "Church Organ",
    "Reed Organ",
    "Accordion",
    "Harmonica",
    "Tango Accordion",
    // Guitar
    "Acoustic Guitar (nylon)",
    "Acoustic Guitar (steel)",
    "Electric Guitar (jazz)",
    "Electric Guitar (clean)",
    "Electric Guitar (muted)",
    "Overdriven Guitar",
    "Distortion Guitar",
    "Guitar Harmonics",
    // Bass
    "Acoustic Bass",
    "Electric Bass (finger)",
    "Electric Bass (pick)",
    "Fretless Bass",
    "Slap Bass 1",
    "Slap Bass 2",
    "Synth Bass 1",
    "Synth Bass 2",
    // Strings
    "Violin",
    "Viola",
    "Cello",
    "Contrabass",
    "Tremolo Strings",
    "Pizzicato Strings",
    "Orchestral Harp",
    "Timpani",
    // Ensemble
    "String Ensemble 1",
    "String Ensemble 2",
    "Synth Strings 1",
    "Synth Strings 2",
    "Choir Aahs",
    "Voice Oohs",
    "Synth Choir",
    "Orchestra Hit",
    // Brass
    "Trumpet",
    "Trombone",
    "Tuba",
    "Muted Trumpet",
    "French Horn",
    "Brass Section",
    "Synth Brass 1",
    "Synth Brass 2",
    // Reed
    "Soprano Sax",
    "Alto Sax",
    "Tenor Sax",
    "Baritone Sax",
    "Oboe",
    "English Horn",
    "Bassoon",
    "Clarinet",
    // Pipe
    "Piccolo",
    "Flute",
    "Recorder",
    "Pan Flute",
    "Blown Bottle",
    "Shakuhachi",
    "Whistle",
    "Ocarina",
    // Synth lead
    "Lead 1 (square)",
    "Lead 2 (sawtooth)",
    "Lead 3 (calliope)",
    "Lead 4 (chiff)",
    "Lead 5 (charang)",
    "Lead 6 (voice)",
    "Lead 7 (fifths)",
    "Lead 8 (bass + lead)",
    // Synth pad
    "Pad 1 (new age)",
    "Pad 2 (warm)",
    "Pad 3 (polysynth)",
    "Pad 4 (choir)",
    "Pad 5 (bowed)",
    "Pad 6 (metallic)",
    "Pad 7 (halo)",
    "Pad 8 (sweep)",
    // Synth effects
    "FX 1 (rain)",
    "FX 2 (soundtrack)",
    "FX 3 (crystal)",
    "FX 4 (atmosphere)",
    "FX 5 (brightness)",
    "FX 6 (goblins)",
    "FX 7 (echoes)",
    "FX 8 (sci-fi)",
    // Ethnic
    "Sitar",
    "Banjo",
    "Shamisen",
    "Koto",
    "Kalimba",
    "Bagpipe",
    "Fiddle",
    "Shanai",
    // Percussive
    "Tinkle Bell",
    "Agogo",
    "Steel Drums",
    "Woodblock",
    "Taiko Drum",
    "Melodic Tom",
    "Synth Drum",
    "Reverse Cymbal",
    // Sound effects
    "Guitar Fret Noise",
    "Breath Noise",
    "Seashore",
    "Bird Tweet",
    "Telephone Ring",
    "Helicopter",
    "Applause",
    "Gunshot",
];

/// Short names people actually type.
const ALIASES: &[(&str, u8)] = &[
    ("piano", 0),
    ("grand piano", 0),
    ("honky tonk", 3),
    ("electric piano", 4),
    ("rhodes", 4),
    ("clavichord", 7),
    ("bells", 14),
    ("hammered dulcimer", 15),
    ("organ", 19),
    ("pipe organ", 19),
    ("harmonium", 20),
    ("squeezebox", 21),
    ("melodeon", 21),
    ("concertina", 23),
    ("bandoneon", 23),
    ("guitar", 24),
    ("nylon guitar", 24),
    ("classical guitar", 24),
    ("steel guitar", 25),
    ("acoustic guitar", 25),
    ("jazz guitar", 26),
    ("electric guitar", 27),
    ("bass", 32),
    ("double bass", 32),
    ("upright bass", 32),
    ("bass guitar", 33),
    ("electric bass", 33),
    ("fretless", 35),
    ("bass fiddle", 43),
    ("strings", 48),
    ("string ensemble", 48),
    ("harp", 46),
    ("choir", 52),
    ("voice", 53),
    ("horn", 60),
    ("brass", 61),
    ("sax", 65),
    ("saxophone", 65),
    ("soprano saxophone", 64),
    ("alto saxophone", 65),
    ("tenor saxophone", 66),
    ("baritone saxophone", 67),
    ("cor anglais", 69),
    ("pan pipes", 75),
    ("panpipes", 75),
    ("tin whistle", 78),
    ("penny whistle", 78),
    ("low whistle", 78),
    ("pipes", 109),
    ("uilleann pipes", 109),
    ("highland pipes", 109),
    ("bagpipes", 109),
    ("shehnai", 111),
    ("steel drum", 114),
    ("steelpan", 114),
    ("wood block", 115),
    ("taiko", 116),
    ("tom", 117),
];

fn normalize(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

static INSTRUMENTS: LazyLock<HashMap<String, u8>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    for (program, name) in GM_PROGRAMS.iter().enumerate() {
        table.insert(normalize(name), program as u8);
    }
    for (alias, program) in ALIASES {
        table.entry(normalize(alias)).or_insert(*program);
    }
    table
});

/// MIDI program number for an instrument name or alias.
///
/// Case, `-`, `_` and repeated spaces are ignored.
pub fn program_number(name: &str) -> Result<u8> {
    INSTRUMENTS
        .get(&normalize(name))
        .copied()
        .ok_or_else(|| ModeError::UnknownInstrument(name.to_string()))
}

/// The General MIDI name of a program number.
pub fn program_name(program: u8) -> Option<&'static str> {
    GM_PROGRAMS.get(usize::from(program)).copied()
}

/// Every known name (GM names and aliases), sorted.
pub fn instrument_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = GM_PROGRAMS
        .iter()
        .copied()
        .chain(ALIASES.iter().map(|(alias, _)| *alias))
        .collect();
    names.sort_by_key(|name| name.to_lowercase());
    names
}

/// `%%MIDI program N` for an instrument.
pub fn midi_program_directive(name: &str) -> Result<String> {
    Ok(format!("%%MIDI program {}", program_number(name)?))
}

/// Insert the program directive for `name` as a line at the cursor.
pub fn insert_instrument(document: &mut Document, name: &str) -> Result<u8> {
    let program = program_number(name)?;
    let directive = format!("%%MIDI program {}", program);
    let at_line_start = document.line_range(document.cursor()).start == document.cursor();
    let text = if at_line_start {
        format!("{}\n", directive)
    } else {
        format!("\n{}\n", directive)
    };
    document.insert(&text);
    Ok(program)
}
