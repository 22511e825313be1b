use clap::ValueEnum;

pub mod channel;
pub mod plain;
pub mod video;

/// Turns one source line into work item identifiers.
///
/// An empty list means the line carries nothing to process, an error marks it malformed.
#[cfg_attr(test, mockall::automock)]
pub trait Parser {
    fn parse(&self, input: &str) -> anyhow::Result<Vec<String>>;
}

impl<P> Parser for Box<P>
where
    P: Parser + ?Sized,
{
    fn parse(&self, input: &str) -> anyhow::Result<Vec<String>> {
        (**self).parse(input)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ParserKind {
    Plain,
    Video,
    Channel,
}

impl ParserKind {
    pub fn build(self) -> Box<dyn Parser + Send + Sync> {
        match self {
            Self::Plain => Box::new(plain::PlainParser),
            Self::Video => Box::new(video::VideoUrlParser),
            Self::Channel => Box::new(channel::ChannelUrlParser),
        }
    }
}

/// Distinct matches in the order they appear.
fn distinct<I>(matches: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut ids: Vec<String> = Vec::new();
    for id in matches {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}
