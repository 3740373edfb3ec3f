/// Wire-format encoding for key-value operations.
///
/// Encoding is a pure function of the operation and the selected format;
/// no I/O and no shared state live here.

/// A single key-value operation, immutable for one request-response cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Put { key: String, value: String },
    Get { key: String },
}

/// Operation kind, used for weighted selection before a concrete
/// operation is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Put,
    Get,
}

impl OpKind {
    pub fn request_type(&self) -> &'static str {
        match self {
            OpKind::Put => "PUT",
            OpKind::Get => "GET",
        }
    }

    /// Reporting label forwarded to the aggregator.
    pub fn label(&self) -> &'static str {
        match self {
            OpKind::Put => "kv_put",
            OpKind::Get => "kv_get",
        }
    }
}

impl Operation {
    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Put { .. } => OpKind::Put,
            Operation::Get { .. } => OpKind::Get,
        }
    }

    pub fn request_type(&self) -> &'static str {
        self.kind().request_type()
    }

    pub fn label(&self) -> &'static str {
        self.kind().label()
    }

    fn tokens(&self) -> Vec<&str> {
        match self {
            Operation::Put { key, value } => vec!["PUT", key, value],
            Operation::Get { key } => vec!["GET", key],
        }
    }
}

/// Byte-level encoding convention for transmitting an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// `"<COMMAND> <arg1> <arg2> ...\n"`, space-separated and newline-terminated.
    Newline,
    /// RESP-like: `*N\r\n` followed by `$<len>\r\n<token>\r\n` per token.
    Multibulk,
}

/// Unit used for the `$<len>` prefix of multibulk tokens.
///
/// `Bytes` produces frames a byte-counting server can parse for any UTF-8
/// token. `Chars` reproduces the legacy character-count behavior, which
/// malforms frames for multi-byte tokens; it exists only as an explicit
/// compatibility choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMode {
    Bytes,
    Chars,
}

impl Default for LengthMode {
    fn default() -> Self {
        LengthMode::Bytes
    }
}

fn token_len(token: &str, mode: LengthMode) -> usize {
    match mode {
        LengthMode::Bytes => token.len(),
        LengthMode::Chars => token.chars().count(),
    }
}

/// Encode an operation under the chosen wire format.
pub fn encode(op: &Operation, format: WireFormat, length_mode: LengthMode) -> Vec<u8> {
    let tokens = op.tokens();
    match format {
        WireFormat::Newline => {
            let mut line = tokens.join(" ");
            line.push('\n');
            line.into_bytes()
        }
        WireFormat::Multibulk => {
            let mut buf = Vec::with_capacity(16 * tokens.len());
            buf.extend_from_slice(format!("*{}\r\n", tokens.len()).as_bytes());
            for token in tokens {
                buf.extend_from_slice(
                    format!("${}\r\n", token_len(token, length_mode)).as_bytes(),
                );
                buf.extend_from_slice(token.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            buf
        }
    }
}
