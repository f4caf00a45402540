//! CLI enum types for turn options.

use clap::ValueEnum;

use avatar_chat::conversation::Tone;

/// Reply tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ToneArg {
    Friendly,
    Formal,
    Casual,
    #[default]
    Neutral,
    Professional,
    Empathetic,
    Humorous,
    Angry,
    Romantic,
}

impl From<ToneArg> for Tone {
    fn from(t: ToneArg) -> Self {
        match t {
            ToneArg::Friendly => Tone::Friendly,
            ToneArg::Formal => Tone::Formal,
            ToneArg::Casual => Tone::Casual,
            ToneArg::Neutral => Tone::Neutral,
            ToneArg::Professional => Tone::Professional,
            ToneArg::Empathetic => Tone::Empathetic,
            ToneArg::Humorous => Tone::Humorous,
            ToneArg::Angry => Tone::Angry,
            ToneArg::Romantic => Tone::Romantic,
        }
    }
}
