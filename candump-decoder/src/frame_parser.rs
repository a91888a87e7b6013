//! candump log line parser
//!
//! Splits one line of a SocketCAN `candump -l` log into its positional fields:
//!
//! ```text
//! (1468514638.123456) can0 0CF004F0#0000000801000000
//! ^ token 0           ^ 1  ^ token 2: identifier, separator, payload
//! ```
//!
//! The identifier is the first 8 characters of token 2 and the payload starts
//! after a fixed offset, so the separator character itself is never inspected.
//! Payload bytes are left as hex text; turning them into numbers is the value
//! decoder's job.

use crate::types::{DecoderError, ParsedFrame, Result};
use std::io::BufRead;

/// Length of the hexadecimal identifier at the start of token 2
pub const IDENTIFIER_LEN: usize = 8;

/// Offset of the first payload character in token 2 (identifier + separator)
pub const DATA_OFFSET: usize = IDENTIFIER_LEN + 1;

/// Characters per payload byte token
const BYTE_TOKEN_LEN: usize = 2;

/// Parse one candump line into a [`ParsedFrame`]
///
/// ```
/// use candump_decoder::frame_parser::parse_line;
///
/// let frame = parse_line("(1468514638.123456) can0 0CFEF2F0#2800FFFFFFFFFFFF").unwrap();
/// assert_eq!(frame.timestamp, "1468514638.123456");
/// assert_eq!(frame.identifier, "0CFEF2F0");
/// assert_eq!(frame.data_field[0], "28");
/// ```
pub fn parse_line(line: &str) -> Result<ParsedFrame<'_>> {
    let mut tokens = line.split_whitespace();
    let (Some(time_token), Some(interface), Some(frame_token)) =
        (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(DecoderError::MalformedLine(format!(
            "expected at least 3 fields in {:?}",
            line.trim_end()
        )));
    };

    // Strip the bracket pair around the timestamp
    let mut chars = time_token.chars();
    if chars.next().is_none() || chars.next_back().is_none() {
        return Err(DecoderError::MalformedLine(format!(
            "timestamp field too short: {:?}",
            time_token
        )));
    }
    let timestamp = chars.as_str();

    if !frame_token.is_ascii() {
        return Err(DecoderError::MalformedLine(format!(
            "frame field is not ASCII: {:?}",
            frame_token
        )));
    }
    if frame_token.len() < DATA_OFFSET {
        return Err(DecoderError::MalformedLine(format!(
            "frame field {:?} shorter than {} characters",
            frame_token, DATA_OFFSET
        )));
    }

    let identifier = &frame_token[..IDENTIFIER_LEN];
    let data_field = split_byte_tokens(&frame_token[DATA_OFFSET..]);

    Ok(ParsedFrame {
        timestamp,
        interface,
        identifier,
        data_field,
    })
}

/// Regroup an ASCII hex payload into 2-character tokens, preserving order
///
/// An odd trailing character becomes a 1-character token.
fn split_byte_tokens(payload: &str) -> Vec<&str> {
    (0..payload.len())
        .step_by(BYTE_TOKEN_LEN)
        .map(|start| &payload[start..(start + BYTE_TOKEN_LEN).min(payload.len())])
        .collect()
}

/// Line-by-line reader over a candump source
///
/// Yields `(line_number, line)` pairs with the line terminator removed. Lines
/// that are not valid UTF-8 come back as [`DecoderError::MalformedLine`] and
/// reading continues; an I/O error on the source is returned once and ends the
/// iteration.
pub struct LineReader<R> {
    reader: R,
    buf: Vec<u8>, // reused between lines
    line_number: usize,
    done: bool,
}

impl<R: BufRead> LineReader<R> {
    /// Wrap a buffered source
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_number: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = (usize, Result<String>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.line_number += 1;
                while matches!(self.buf.last(), Some(b'\n') | Some(b'\r')) {
                    self.buf.pop();
                }
                let line = std::str::from_utf8(&self.buf)
                    .map(str::to_owned)
                    .map_err(|e| {
                        DecoderError::MalformedLine(format!("invalid UTF-8: {}", e))
                    });
                Some((self.line_number, line))
            }
            Err(e) => {
                self.done = true;
                Some((self.line_number + 1, Err(DecoderError::IoError(e))))
            }
        }
    }
}
