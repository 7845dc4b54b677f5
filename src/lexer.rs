//! Byte-level scanning shared by the detector, the indentation inferencer and
//! the textual patcher.
//!
//! Every structural delimiter in JSON/JSON5 is ASCII, so scanning the UTF-8
//! bytes directly never splits a multi-byte character at a delimiter.

use crate::MergeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Code,
    String,
    LineComment,
    BlockComment,
}

/// Classify every byte of `text` into the region it belongs to.
///
/// Quote characters belong to their string; comment markers belong to their
/// comment. Unterminated strings and block comments run to the end of input.
pub fn regions(text: &str) -> Vec<Region> {
    scan(text).0
}

/// Region of every byte, plus the region the scan ended in.
fn scan(text: &str) -> (Vec<Region>, Region) {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut state = Region::Code;
    let mut escaped = false;
    let mut i = 0;

    while let Some(&byte) = bytes.get(i) {
        let next = bytes.get(i.saturating_add(1)).copied();
        match state {
            Region::Code => match (byte, next) {
                (b'"', _) => {
                    state = Region::String;
                    out.push(Region::String);
                },
                (b'/', Some(b'/')) => {
                    state = Region::LineComment;
                    out.push(Region::LineComment);
                },
                (b'/', Some(b'*')) => {
                    state = Region::BlockComment;
                    out.extend([Region::BlockComment, Region::BlockComment]);
                    i = i.saturating_add(2);
                    continue;
                },
                _ => out.push(Region::Code),
            },
            Region::String => {
                out.push(Region::String);
                if escaped {
                    escaped = false;
                } else if byte == b'\\' {
                    escaped = true;
                } else if byte == b'"' {
                    state = Region::Code;
                }
            },
            Region::LineComment => {
                if byte == b'\n' {
                    state = Region::Code;
                    out.push(Region::Code);
                } else {
                    out.push(Region::LineComment);
                }
            },
            Region::BlockComment => {
                out.push(Region::BlockComment);
                if byte == b'*' && next == Some(b'/') {
                    out.push(Region::BlockComment);
                    state = Region::Code;
                    i = i.saturating_add(2);
                    continue;
                }
            },
        }
        i = i.saturating_add(1);
    }

    (out, state)
}

/// A key/value pair found directly inside an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Decoded key text.
    pub key: String,
    /// Offset of the first byte of the key (the opening quote when quoted).
    pub key_start: usize,
    pub value_start: usize,
    /// Exclusive end of the value.
    pub value_end: usize,
    /// Offset of the comma following the value, if any.
    pub comma: Option<usize>,
}

/// A lexed document: regions, bracket pairs and nesting depth per offset.
#[derive(Debug)]
pub struct Lexed<'a> {
    text: &'a str,
    regions: Vec<Region>,
    partner: Vec<Option<usize>>,
    depth: Vec<u32>,
}

impl<'a> Lexed<'a> {
    /// Lex `text` and match its brackets.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Unbalanced`] when a bracket is unmatched or closed
    /// by the wrong kind of bracket, or a string never terminates.
    pub fn new(text: &'a str) -> Result<Self, MergeError> {
        let (regions, last_state) = scan(text);
        let bytes = text.as_bytes();
        let mut partner = vec![None; bytes.len()];
        let mut depth = Vec::with_capacity(bytes.len().saturating_add(1));
        let mut stack: Vec<usize> = Vec::new();

        if last_state == Region::String {
            return Err(MergeError::Unbalanced { offset: bytes.len() });
        }

        for (i, (&byte, &region)) in bytes.iter().zip(&regions).enumerate() {
            depth.push(u32::try_from(stack.len()).unwrap_or(u32::MAX));
            if region != Region::Code {
                continue;
            }
            match byte {
                b'{' | b'[' => stack.push(i),
                b'}' | b']' => {
                    let open = stack.pop().ok_or(MergeError::Unbalanced { offset: i })?;
                    let expected = if byte == b'}' { b'{' } else { b'[' };
                    if bytes.get(open) != Some(&expected) {
                        return Err(MergeError::Unbalanced { offset: i });
                    }
                    if let Some(slot) = partner.get_mut(open) {
                        *slot = Some(i);
                    }
                    if let Some(slot) = partner.get_mut(i) {
                        *slot = Some(open);
                    }
                },
                _ => {},
            }
        }
        depth.push(u32::try_from(stack.len()).unwrap_or(u32::MAX));

        if let Some(&open) = stack.last() {
            return Err(MergeError::Unbalanced { offset: open });
        }

        Ok(Self { text, regions, partner, depth })
    }

    pub const fn text(&self) -> &'a str {
        self.text
    }

    fn byte(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(offset).copied()
    }

    pub fn region(&self, offset: usize) -> Option<Region> {
        self.regions.get(offset).copied()
    }

    /// Whether `offset` holds a structural (non-string, non-comment) byte.
    pub fn is_code(&self, offset: usize) -> bool {
        self.region(offset) == Some(Region::Code)
    }

    /// Number of brackets open just before `offset`.
    pub fn depth_at(&self, offset: usize) -> u32 {
        self.depth.get(offset).or_else(|| self.depth.last()).copied().unwrap_or(0)
    }

    /// Offset of the bracket matching the one at `offset`.
    pub fn partner(&self, offset: usize) -> Option<usize> {
        self.partner.get(offset).copied().flatten()
    }

    /// Skip whitespace and comments starting at `offset`.
    pub fn skip_trivia(&self, mut offset: usize) -> usize {
        while let Some(byte) = self.byte(offset) {
            let trivia = match self.region(offset) {
                Some(Region::LineComment | Region::BlockComment) => true,
                Some(Region::Code) => byte.is_ascii_whitespace(),
                _ => false,
            };
            if !trivia {
                break;
            }
            offset = offset.saturating_add(1);
        }
        offset
    }

    /// First structural byte of the document, which must open the root object.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::NotAnObject`] when the document does not start
    /// with `{`.
    pub fn root_object(&self) -> Result<(usize, usize), MergeError> {
        let open = self.skip_trivia(0);
        if self.byte(open) != Some(b'{') {
            return Err(MergeError::NotAnObject);
        }
        let close = self.partner(open).ok_or(MergeError::Unbalanced { offset: open })?;
        Ok((open, close))
    }

    /// Exclusive end of the string whose opening quote is at `start`.
    fn string_end(&self, start: usize) -> Result<usize, MergeError> {
        let mut offset = start.saturating_add(1);
        while let Some(byte) = self.byte(offset) {
            match byte {
                b'\\' => offset = offset.saturating_add(2),
                b'"' => return Ok(offset.saturating_add(1)),
                _ => offset = offset.saturating_add(1),
            }
        }
        Err(MergeError::Unbalanced { offset: start })
    }

    /// Exclusive end of the value starting at `start`.
    fn value_end(&self, start: usize) -> Result<usize, MergeError> {
        match self.byte(start) {
            Some(b'{' | b'[') => self
                .partner(start)
                .map(|close| close.saturating_add(1))
                .ok_or(MergeError::Unbalanced { offset: start }),
            Some(b'"') if self.region(start) == Some(Region::String) => self.string_end(start),
            Some(_) => {
                let mut offset = start;
                while let Some(byte) = self.byte(offset) {
                    if !self.is_code(offset)
                        || byte.is_ascii_whitespace()
                        || matches!(byte, b',' | b'}' | b']')
                    {
                        break;
                    }
                    offset = offset.saturating_add(1);
                }
                if offset == start {
                    return Err(MergeError::Malformed { offset, reason: "expected a value" });
                }
                Ok(offset)
            },
            None => Err(MergeError::Malformed { offset: start, reason: "unexpected end of input" }),
        }
    }

    /// Key at `start`: a double-quoted string or a JSON5 identifier.
    ///
    /// Quoted keys are returned decoded, so `"b\u006fost"` reads as `boost`.
    fn key_at(&self, start: usize) -> Result<(String, usize), MergeError> {
        if self.byte(start) == Some(b'"') {
            let end = self.string_end(start)?;
            let quoted = self.text.get(start..end).unwrap_or_default();
            let key = serde_json::from_str::<String>(quoted).or_else(|_| {
                // JSON5-only escapes; compare the raw text instead.
                quoted
                    .get(1..quoted.len().saturating_sub(1))
                    .map(str::to_string)
                    .ok_or(MergeError::Malformed { offset: start, reason: "expected an object key" })
            })?;
            return Ok((key, end));
        }

        let mut end = start;
        while let Some(byte) = self.byte(end) {
            if !(byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$') {
                break;
            }
            end = end.saturating_add(1);
        }
        if end == start {
            return Err(MergeError::Malformed { offset: start, reason: "expected an object key" });
        }
        Ok((self.text.get(start..end).unwrap_or_default().to_string(), end))
    }

    /// Walk the members directly inside the object opened at `open`.
    ///
    /// # Errors
    ///
    /// Returns an error when `open` is not an object or its contents cannot be
    /// walked member by member.
    pub fn members(&self, open: usize) -> Result<Vec<Member>, MergeError> {
        if self.byte(open) != Some(b'{') || !self.is_code(open) {
            return Err(MergeError::Malformed { offset: open, reason: "expected an object" });
        }
        let close = self.partner(open).ok_or(MergeError::Unbalanced { offset: open })?;
        let mut members = Vec::new();
        let mut offset = self.skip_trivia(open.saturating_add(1));

        while offset < close {
            if self.byte(offset) == Some(b',') {
                // Stray separator, tolerated like a trailing comma.
                offset = self.skip_trivia(offset.saturating_add(1));
                continue;
            }

            let key_start = offset;
            let (key, key_end) = self.key_at(key_start)?;
            let colon = self.skip_trivia(key_end);
            if self.byte(colon) != Some(b':') {
                return Err(MergeError::Malformed { offset: colon, reason: "expected ':'" });
            }
            let value_start = self.skip_trivia(colon.saturating_add(1));
            let value_end = self.value_end(value_start)?;

            let after = self.skip_trivia(value_end);
            let comma = (self.byte(after) == Some(b',')).then_some(after);
            if comma.is_none() && after != close {
                return Err(MergeError::Malformed { offset: after, reason: "expected ',' or '}'" });
            }

            members.push(Member { key, key_start, value_start, value_end, comma });
            offset = comma.map_or(after, |c| self.skip_trivia(c.saturating_add(1)));
        }

        Ok(members)
    }

    /// Start offset of the line containing `offset`.
    pub fn line_start(&self, offset: usize) -> usize {
        self.text.get(..offset).and_then(|head| head.rfind('\n')).map_or(0, |nl| nl.saturating_add(1))
    }

    /// Leading whitespace of the line containing `offset`.
    pub fn line_indent(&self, offset: usize) -> &'a str {
        let start = self.line_start(offset);
        let rest = self.text.get(start..).unwrap_or_default();
        let width = rest.len().saturating_sub(rest.trim_start_matches([' ', '\t']).len());
        rest.get(..width).unwrap_or_default()
    }

    /// Whether only whitespace precedes `offset` on its line.
    pub fn starts_line(&self, offset: usize) -> bool {
        let start = self.line_start(offset);
        self.text.get(start..offset).is_some_and(|prefix| prefix.trim().is_empty())
    }
}
