//! SPIR-V for the Shapes triangle.
//!
//! GLSL sources live in `shaders/` and are compiled at build time using
//! shaderc. The renderer treats the results as opaque bytes.

/// Embedded SPIR-V shader bytecode (raw bytes, may not be aligned).
mod spirv_bytes {
    pub static TRIANGLE_VERT: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/triangle.vert.spv"));
    pub static TRIANGLE_FRAG: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/triangle.frag.spv"));
}

/// Vertex stage: three hard-coded positions, one color per corner.
pub fn triangle_vertex() -> &'static [u8] {
    spirv_bytes::TRIANGLE_VERT
}

/// Fragment stage: passes the interpolated color through.
pub fn triangle_fragment() -> &'static [u8] {
    spirv_bytes::TRIANGLE_FRAG
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_word(bytes: &[u8]) -> u32 {
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[test]
    fn shaders_are_spirv() {
        for shader in [triangle_vertex(), triangle_fragment()] {
            assert_eq!(shader.len() % 4, 0, "SPIR-V must be a whole number of words");
            assert_eq!(first_word(shader), 0x0723_0203, "Invalid SPIR-V magic number");
        }
    }
}
