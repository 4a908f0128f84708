use super::{PipelineError, ShaderReflection};

/// Per-attribute data type. All components are `f32`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexData {
    Float1,
    Float2,
    Float3,
    Float4,
}

impl VertexData {
    pub fn components(self) -> usize {
        match self {
            Self::Float1 => 1,
            Self::Float2 => 2,
            Self::Float3 => 3,
            Self::Float4 => 4,
        }
    }

    fn format(self) -> wgpu::VertexFormat {
        match self {
            Self::Float1 => wgpu::VertexFormat::Float32,
            Self::Float2 => wgpu::VertexFormat::Float32x2,
            Self::Float3 => wgpu::VertexFormat::Float32x3,
            Self::Float4 => wgpu::VertexFormat::Float32x4,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VertexElement {
    pub name: String,
    pub data: VertexData,
}

/// Ordered, tightly packed vertex layout.
///
/// Element order fixes the byte offsets inside a vertex; shader locations are
/// looked up by element name when a pipeline is compiled.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct VertexStructure {
    elements: Vec<VertexElement>,
}

impl VertexStructure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, data: VertexData) {
        self.elements.push(VertexElement {
            name: name.into(),
            data,
        });
    }

    pub fn elements(&self) -> &[VertexElement] {
        &self.elements
    }

    /// Floats per vertex.
    pub fn floats_per_vertex(&self) -> usize {
        self.elements.iter().map(|e| e.data.components()).sum()
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> u64 {
        (self.floats_per_vertex() * std::mem::size_of::<f32>()) as u64
    }

    /// Builds wgpu attributes, resolving each element's location by name in
    /// the vertex shader. Every shader input must be covered.
    pub(crate) fn attributes(
        &self,
        vertex: &ShaderReflection,
    ) -> Result<Vec<wgpu::VertexAttribute>, PipelineError> {
        let mut offset = 0u64;
        let mut attributes = Vec::with_capacity(self.elements.len());

        for element in &self.elements {
            let shader_location = vertex
                .input_location(&element.name)
                .ok_or_else(|| PipelineError::MissingAttribute(element.name.clone()))?;

            attributes.push(wgpu::VertexAttribute {
                format: element.data.format(),
                offset,
                shader_location,
            });
            offset += element.data.format().size();
        }

        if let Some((name, _)) = vertex
            .inputs()
            .iter()
            .find(|(name, _)| !self.elements.iter().any(|e| &e.name == name))
        {
            return Err(PipelineError::UnboundInput(name.clone()));
        }

        Ok(attributes)
    }
}
