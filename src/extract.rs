//! Fenced code block extraction from model output.
//!
//! A block opens with ```` ```<tag> ```` (the tag must be followed by
//! whitespace or the end of the input). If the opening line also holds a
//! closing ```` ``` ````, the text between them is the block. Otherwise the
//! rest of the opening line is an info string and is dropped, and the body
//! runs until the first line that ends in ```` ``` ```` or, failing that, the
//! next line that opens another block. Backticks in the middle of a code line
//! never close it.

use regex::Regex;

use crate::errors::ExtractError;

const FENCE: &str = "```";

/// Extracts the first fenced block for one language tag.
#[derive(Debug, Clone)]
pub struct FenceExtractor {
    tag: String,
    opener: Regex,
}

impl FenceExtractor {
    pub fn new(tag: &str) -> Self {
        let opener = Regex::new(&format!(r"{FENCE}{}(?:\s|$)", regex::escape(tag)))
            .expect("escaped fence tag forms a valid pattern");

        Self {
            tag: tag.to_string(),
            opener,
        }
    }

    /// Return the trimmed body of the first matching block.
    pub fn extract(&self, response: &str) -> Result<String, ExtractError> {
        let no_fence = || ExtractError::NoFence {
            tag: self.tag.clone(),
        };

        let opener = self.opener.find(response).ok_or_else(no_fence)?;
        let after_tag = opener.start() + FENCE.len() + self.tag.len();
        let line_end = response[after_tag..]
            .find('\n')
            .map_or(response.len(), |i| after_tag + i);
        let opening_line = &response[after_tag..line_end];

        let body = match opening_line.find(FENCE) {
            Some(close) => &opening_line[..close],
            None if line_end < response.len() => {
                block_body(&response[line_end + 1..]).ok_or_else(no_fence)?
            }
            None => return Err(no_fence()),
        };

        let body = body.trim();
        if body.is_empty() {
            return Err(ExtractError::EmptyBlock {
                tag: self.tag.clone(),
            });
        }

        Ok(body.to_string())
    }
}

/// The lines of `text` up to the block's end, or `None` if it never ends.
fn block_body(text: &str) -> Option<&str> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let content = line.trim_end();
        if opens_block(content) {
            return Some(&text[..offset]);
        }
        if let Some(code) = content.strip_suffix(FENCE) {
            return Some(&text[..offset + code.len()]);
        }
        offset += line.len();
    }
    None
}

/// A line starting with ```` ```<word> ````.
fn opens_block(line: &str) -> bool {
    line.trim_start()
        .strip_prefix(FENCE)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_whitespace() && c != '`')
}

/// Convenience wrapper around [`FenceExtractor`].
pub fn extract_code_block(response: &str, tag: &str) -> Result<String, ExtractError> {
    FenceExtractor::new(tag).extract(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_body_between_prose() {
        let response = "Here is your page:\n\n```html\n<html><body>hi</body></html>\n```\n\nEnjoy!";
        assert_eq!(
            extract_code_block(response, "html").unwrap(),
            "<html><body>hi</body></html>"
        );
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let response = "```python\n\n   import streamlit as st\nst.title('x')   \n\n```";
        assert_eq!(
            extract_code_block(response, "python").unwrap(),
            "import streamlit as st\nst.title('x')"
        );
    }

    #[test]
    fn test_no_fence_is_an_error() {
        let err = extract_code_block("I cannot build that.", "html").unwrap_err();
        assert_eq!(
            err,
            ExtractError::NoFence {
                tag: "html".to_string()
            }
        );
    }

    #[test]
    fn test_other_tag_does_not_match() {
        let response = "```javascript\nconsole.log(1)\n```";
        assert!(matches!(
            extract_code_block(response, "html"),
            Err(ExtractError::NoFence { .. })
        ));
    }

    #[test]
    fn test_tag_prefix_does_not_match() {
        let response = "```htmlx\n<p>nope</p>\n```";
        assert!(extract_code_block(response, "html").is_err());
    }

    #[test]
    fn test_first_block_wins() {
        let response = "```vue\n<template>one</template>\n```\ntext\n```vue\n<template>two</template>\n```";
        assert_eq!(
            extract_code_block(response, "vue").unwrap(),
            "<template>one</template>"
        );
    }

    #[test]
    fn test_skips_blocks_with_other_tags() {
        let response = "```bash\npip install streamlit\n```\n\n```python\nprint('app')\n```";
        assert_eq!(extract_code_block(response, "python").unwrap(), "print('app')");
    }

    #[test]
    fn test_inline_backticks_do_not_close_block() {
        let response = "```python\nst.markdown(\"```python\\nx = 1\\n```\")\nst.write('done')\n```";
        assert_eq!(
            extract_code_block(response, "python").unwrap(),
            "st.markdown(\"```python\\nx = 1\\n```\")\nst.write('done')"
        );
    }

    #[test]
    fn test_single_line_block() {
        let response = "Sure: ```html <p>tiny</p>```";
        assert_eq!(extract_code_block(response, "html").unwrap(), "<p>tiny</p>");
    }

    #[test]
    fn test_close_on_code_line_does_not_run_into_next_block() {
        let response = "```python\nprint(1)```\nprose\n```bash\nx\n```";
        assert_eq!(extract_code_block(response, "python").unwrap(), "print(1)");
    }

    #[test]
    fn test_single_line_first_block_wins_over_later_block() {
        let response = "```html <p>a</p>```\n\n```html\n<p>b</p>\n```";
        assert_eq!(extract_code_block(response, "html").unwrap(), "<p>a</p>");
    }

    #[test]
    fn test_info_string_after_tag_is_dropped() {
        let response = "```html title=page\n<p>a</p>\n```";
        assert_eq!(extract_code_block(response, "html").unwrap(), "<p>a</p>");
    }

    #[test]
    fn test_unclosed_block_ends_at_next_opener() {
        let response = "```python\nprint(1)\n```bash\nls\n```";
        assert_eq!(extract_code_block(response, "python").unwrap(), "print(1)");
    }

    #[test]
    fn test_crlf_line_endings() {
        let response = "```html\r\n<div>x</div>\r\n```\r\n";
        assert_eq!(extract_code_block(response, "html").unwrap(), "<div>x</div>");
    }

    #[test]
    fn test_indented_closing_fence() {
        let response = "1. Code:\n   ```html\n   <p>a</p>\n   ```\n";
        assert_eq!(extract_code_block(response, "html").unwrap(), "<p>a</p>");
    }

    #[test]
    fn test_empty_block_is_an_error() {
        let err = extract_code_block("```html\n\n```", "html").unwrap_err();
        assert_eq!(
            err,
            ExtractError::EmptyBlock {
                tag: "html".to_string()
            }
        );
    }

    #[test]
    fn test_unclosed_block_is_an_error() {
        let response = "```html\n<html><body>truncated";
        assert!(matches!(
            extract_code_block(response, "html"),
            Err(ExtractError::NoFence { .. })
        ));
    }

    #[test]
    fn test_tag_with_regex_metacharacters() {
        let extractor = FenceExtractor::new("c++");
        assert_eq!(extractor.extract("```c++\nint main() {}\n```").unwrap(), "int main() {}");
    }
}
