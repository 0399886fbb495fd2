//! STL triangle soups, binary or ASCII.

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

/// Non-indexed triangle list: three consecutive positions per facet,
/// with the facet normal repeated per vertex.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StlMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
}

impl StlMesh {
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StlError {
    UnexpectedEof,
    InvalidUtf8,
    InvalidAscii { line: usize, reason: String },
}

impl std::fmt::Display for StlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StlError::UnexpectedEof => write!(f, "unexpected end of STL data"),
            StlError::InvalidUtf8 => write!(f, "ASCII STL is not valid UTF-8"),
            StlError::InvalidAscii { line, reason } => {
                write!(f, "invalid ASCII STL at line {line}: {reason}")
            }
        }
    }
}

impl std::error::Error for StlError {}

pub fn decode_stl(bytes: &[u8]) -> Result<StlMesh, StlError> {
    // Binary files may also start with "solid", so trust the size formula first.
    if let Some(count) = binary_triangle_count(bytes)
        && bytes.len() == HEADER_LEN + 4 + count * TRIANGLE_LEN
    {
        return decode_binary(bytes, count);
    }
    if bytes.trim_ascii_start().starts_with(b"solid") {
        return decode_ascii(bytes);
    }
    let count = binary_triangle_count(bytes).ok_or(StlError::UnexpectedEof)?;
    decode_binary(bytes, count)
}

fn binary_triangle_count(bytes: &[u8]) -> Option<usize> {
    let raw = bytes.get(HEADER_LEN..HEADER_LEN + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize)
}

fn decode_binary(bytes: &[u8], count: usize) -> Result<StlMesh, StlError> {
    let body = &bytes[HEADER_LEN + 4..];
    if body.len() < count * TRIANGLE_LEN {
        return Err(StlError::UnexpectedEof);
    }

    let mut mesh = StlMesh {
        positions: Vec::with_capacity(count * 3),
        normals: Vec::with_capacity(count * 3),
    };
    for tri in body.chunks_exact(TRIANGLE_LEN).take(count) {
        let normal = read_vec3(&tri[0..12]);
        for v in 0..3 {
            let start = 12 + v * 12;
            mesh.positions.push(read_vec3(&tri[start..start + 12]));
            mesh.normals.push(normal);
        }
    }
    Ok(mesh)
}

fn read_vec3(b: &[u8]) -> [f32; 3] {
    let f = |i: usize| f32::from_le_bytes([b[i], b[i + 1], b[i + 2], b[i + 3]]);
    [f(0), f(4), f(8)]
}

fn decode_ascii(bytes: &[u8]) -> Result<StlMesh, StlError> {
    let text = std::str::from_utf8(bytes).map_err(|_| StlError::InvalidUtf8)?;
    let mut mesh = StlMesh::default();
    let mut normal = [0.0f32; 3];
    let mut vertices_in_facet = 0;

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("facet") => {
                if tokens.next() != Some("normal") {
                    return Err(invalid(line_no, "expected `facet normal`"));
                }
                normal = parse_triplet(&mut tokens, line_no)?;
                vertices_in_facet = 0;
            }
            Some("vertex") => {
                if vertices_in_facet == 3 {
                    return Err(invalid(line_no, "more than three vertices in facet"));
                }
                mesh.positions.push(parse_triplet(&mut tokens, line_no)?);
                mesh.normals.push(normal);
                vertices_in_facet += 1;
            }
            Some("endfacet") if vertices_in_facet != 3 => {
                return Err(invalid(line_no, "facet without three vertices"));
            }
            _ => {}
        }
    }
    Ok(mesh)
}

fn parse_triplet<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<[f32; 3], StlError> {
    let mut out = [0.0f32; 3];
    for slot in &mut out {
        let tok = tokens.next().ok_or_else(|| invalid(line, "missing coordinate"))?;
        *slot = tok
            .parse()
            .map_err(|_| invalid(line, &format!("bad number `{tok}`")))?;
    }
    Ok(out)
}

fn invalid(line: usize, reason: &str) -> StlError {
    StlError::InvalidAscii {
        line,
        reason: reason.to_string(),
    }
}
