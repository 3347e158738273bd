use spiderscene_render::ShaderProgram;

/// Halftone shading for the spider meshes. One vertex stage, one fragment
/// entry point per [`ShaderProgram`]: round dots or stripes.
pub const SPIDER_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

struct SpiderMaterial {
    color: vec4<f32>,
    shadow_color: vec4<f32>,
    light_color: vec4<f32>,
    resolution: vec2<f32>,
    shadow_repetitions: f32,
    light_repetitions: f32,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var<uniform> material: SpiderMaterial;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    var out: VertexOutput;
    out.clip_position = camera.view_proj * model * vec4<f32>(vertex.position, 1.0);
    out.world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;
    return out;
}

// Screen-space cell coordinates, square cells sized by the viewport height.
fn cell_uv(frag: vec2<f32>, repetitions: f32) -> vec2<f32> {
    return fract(frag / material.resolution.y * repetitions);
}

fn dot_mask(frag: vec2<f32>, repetitions: f32, intensity: f32) -> f32 {
    let uv = cell_uv(frag, repetitions);
    return 1.0 - step(0.5 * intensity, distance(uv, vec2<f32>(0.5)));
}

fn line_mask(frag: vec2<f32>, repetitions: f32, intensity: f32) -> f32 {
    let uv = cell_uv(frag, repetitions);
    return 1.0 - step(intensity, abs(uv.y - 0.5) * 2.0);
}

fn shadow_intensity(normal: vec3<f32>) -> f32 {
    return smoothstep(-0.8, 1.5, dot(normal, vec3<f32>(0.0, -1.0, 0.0)));
}

fn light_intensity(normal: vec3<f32>) -> f32 {
    return smoothstep(0.5, 1.5, dot(normal, normalize(vec3<f32>(1.0, 1.0, 0.0))));
}

@fragment
fn fs_dots(in: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(in.world_normal);
    let frag = in.clip_position.xy;
    var color = material.color.rgb;
    color = mix(color, material.shadow_color.rgb,
        dot_mask(frag, material.shadow_repetitions, shadow_intensity(normal)));
    color = mix(color, material.light_color.rgb,
        dot_mask(frag, material.light_repetitions, light_intensity(normal)));
    return vec4<f32>(color, 1.0);
}

@fragment
fn fs_lines(in: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(in.world_normal);
    let frag = in.clip_position.xy;
    var color = material.color.rgb;
    color = mix(color, material.shadow_color.rgb,
        line_mask(frag, material.shadow_repetitions, shadow_intensity(normal)));
    color = mix(color, material.light_color.rgb,
        line_mask(frag, material.light_repetitions, light_intensity(normal)));
    return vec4<f32>(color, 1.0);
}

// Meshes without a spider material: base color, half-Lambert.
@fragment
fn fs_flat(in: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(in.world_normal);
    let diffuse = 0.5 + 0.5 * max(dot(normal, normalize(vec3<f32>(1.0, 1.0, 0.0))), 0.0);
    return vec4<f32>(material.color.rgb * diffuse, 1.0);
}
"#;

/// Fragment entry point for meshes that keep their own color.
pub const FLAT_ENTRY: &str = "fs_flat";

/// Full-viewport quad, black with a uniform alpha.
pub const OVERLAY_SHADER: &str = r#"
struct Overlay {
    alpha: f32,
};

@group(0) @binding(0)
var<uniform> overlay: Overlay;

@vertex
fn vs_overlay(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
    );
    return vec4<f32>(corners[index], 0.0, 1.0);
}

@fragment
fn fs_overlay() -> @location(0) vec4<f32> {
    return vec4<f32>(0.0, 0.0, 0.0, overlay.alpha);
}
"#;

pub fn fragment_entry(program: ShaderProgram) -> &'static str {
    match program {
        ShaderProgram::Spider1 => "fs_dots",
        ShaderProgram::Spider2 => "fs_lines",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_program_has_an_entry_point() {
        for program in [ShaderProgram::Spider1, ShaderProgram::Spider2] {
            let entry = format!("fn {}(", fragment_entry(program));
            assert!(SPIDER_SHADER.contains(&entry), "{entry}");
        }
        assert!(SPIDER_SHADER.contains(&format!("fn {FLAT_ENTRY}(")));
    }

    #[test]
    fn material_struct_field_order() {
        let fields = [
            "color: vec4<f32>",
            "shadow_color: vec4<f32>",
            "light_color: vec4<f32>",
            "resolution: vec2<f32>",
            "shadow_repetitions: f32",
            "light_repetitions: f32",
        ];
        let mut at = SPIDER_SHADER.find("struct SpiderMaterial").unwrap();
        for field in fields {
            let found = SPIDER_SHADER[at..].find(field).unwrap();
            at += found + field.len();
        }
    }
}
