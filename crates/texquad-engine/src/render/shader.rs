use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::{RenderCtx, ShaderError};

/// Pipeline stage a shader module is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }

    pub(crate) fn visibility(self) -> wgpu::ShaderStages {
        match self {
            Self::Vertex => wgpu::ShaderStages::VERTEX,
            Self::Fragment => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

/// What a module-scope resource binding holds.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BindingKind {
    /// Uniform buffer of `size` bytes (WGSL layout, padding included).
    Uniform { size: u32 },
    /// Filterable 2D float texture.
    Texture,
    Sampler,
}

impl BindingKind {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            Self::Uniform { .. } => "constant",
            Self::Texture => "texture",
            Self::Sampler => "sampler",
        }
    }
}

/// A named `@group/@binding` resource declared by a shader.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ShaderBinding {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub kind: BindingKind,
}

/// Everything a pipeline needs to know about a shader, gathered on the CPU.
#[derive(Debug, Clone)]
pub struct ShaderReflection {
    stage: ShaderStage,
    entry_point: String,
    bindings: Vec<ShaderBinding>,
    /// `(name, @location)` of the entry point's inputs.
    inputs: Vec<(String, u32)>,
}

impl ShaderReflection {
    /// Parses and validates WGSL, then extracts the entry point for `stage`
    /// and the module's resource bindings.
    pub fn from_wgsl(source: &str, stage: ShaderStage) -> Result<Self, ShaderError> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| ShaderError::Parse(e.emit_to_string(source)))?;

        Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .map_err(|e| ShaderError::Validation(e.emit_to_string(source)))?;

        let entry = module
            .entry_points
            .iter()
            .find(|ep| ep.stage == stage.naga())
            .ok_or(ShaderError::MissingEntryPoint(stage))?;

        let mut bindings = Vec::new();
        for (_, var) in module.global_variables.iter() {
            let (Some(name), Some(rb)) = (&var.name, &var.binding) else {
                continue;
            };

            let inner = &module.types[var.ty].inner;
            let kind = match inner {
                naga::TypeInner::Image { .. } => BindingKind::Texture,
                naga::TypeInner::Sampler { .. } => BindingKind::Sampler,
                _ if var.space == naga::AddressSpace::Uniform => BindingKind::Uniform {
                    size: inner.size(module.to_ctx()),
                },
                _ => return Err(ShaderError::UnsupportedBinding { name: name.clone() }),
            };

            bindings.push(ShaderBinding {
                name: name.clone(),
                group: rb.group,
                binding: rb.binding,
                kind,
            });
        }
        bindings.sort_by_key(|b| (b.group, b.binding));

        let mut inputs = Vec::new();
        for arg in &entry.function.arguments {
            match &arg.binding {
                Some(naga::Binding::Location { location, .. }) => {
                    if let Some(name) = &arg.name {
                        inputs.push((name.clone(), *location));
                    }
                }
                Some(naga::Binding::BuiltIn(_)) => {}
                None => {
                    // Struct argument: inputs are its located members.
                    if let naga::TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                        for member in members {
                            if let (Some(name), Some(naga::Binding::Location { location, .. })) =
                                (&member.name, &member.binding)
                            {
                                inputs.push((name.clone(), *location));
                            }
                        }
                    }
                }
            }
        }

        Ok(Self {
            stage,
            entry_point: entry.name.clone(),
            bindings,
            inputs,
        })
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn bindings(&self) -> &[ShaderBinding] {
        &self.bindings
    }

    pub fn inputs(&self) -> &[(String, u32)] {
        &self.inputs
    }

    /// `@location` of the entry-point input called `name`.
    pub fn input_location(&self, name: &str) -> Option<u32> {
        self.inputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, location)| location)
    }
}

/// A compiled shader module plus its reflection.
pub struct Shader {
    module: wgpu::ShaderModule,
    reflection: ShaderReflection,
}

impl Shader {
    /// Compiles WGSL `source` bytes for `stage`.
    ///
    /// Parse and validation errors are reported here, before wgpu sees the
    /// source.
    pub fn new(
        ctx: &RenderCtx<'_>,
        source: &[u8],
        stage: ShaderStage,
        label: &str,
    ) -> Result<Self, ShaderError> {
        let text = std::str::from_utf8(source)?;
        let reflection = ShaderReflection::from_wgsl(text, stage)?;

        let module = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(text.into()),
        });

        log::debug!(
            "compiled {label} ({stage:?}, entry {:?}, {} bindings)",
            reflection.entry_point,
            reflection.bindings.len()
        );
        Ok(Self { module, reflection })
    }

    pub fn stage(&self) -> ShaderStage {
        self.reflection.stage
    }

    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    pub(crate) fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }
}
