use crate::parser::Parser;

/// Takes the whole line as the identifier. Lines starting with `#` are comments.
#[derive(Debug)]
pub struct PlainParser;

impl Parser for PlainParser {
    fn parse(&self, input: &str) -> anyhow::Result<Vec<String>> {
        let id = input.trim();
        if id.starts_with('#') {
            return Ok(Vec::new());
        }
        if id.is_empty() {
            anyhow::bail!("empty identifier");
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            anyhow::bail!("identifier contains whitespace: {id:?}");
        }

        Ok(vec![id.to_string()])
    }
}
