//! Static reference catalogue of example memes

use std::fmt;

/// Reaction a meme conveys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Confused,
    Content,
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Confused => "confused",
            Mood::Content => "content",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryEntry {
    pub name: &'static str,
    pub mood: Mood,
    pub description: &'static str,
}

/// Fixed catalogue shown next to every analysis. Not derived from results.
pub const REFERENCE_LIBRARY: [LibraryEntry; 6] = [
    LibraryEntry { name: "Success Kid", mood: Mood::Happy, description: "Excited reaction" },
    LibraryEntry { name: "Sad Cat", mood: Mood::Sad, description: "Disappointed reaction" },
    LibraryEntry { name: "Angry Baby", mood: Mood::Angry, description: "Frustrated reaction" },
    LibraryEntry { name: "Happy Dog", mood: Mood::Happy, description: "Joyful reaction" },
    LibraryEntry { name: "Confused Cat", mood: Mood::Confused, description: "Puzzled reaction" },
    LibraryEntry { name: "Satisfied Frog", mood: Mood::Content, description: "Content reaction" },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue() {
        assert_eq!(REFERENCE_LIBRARY.len(), 6);
        assert_eq!(REFERENCE_LIBRARY[0].name, "Success Kid");
        assert_eq!(REFERENCE_LIBRARY[5].mood.to_string(), "content");
    }
}
