/// WGSL shader for the instanced cubes: Lambert shading under a hemisphere
/// light plus one directional light.
pub const CUBE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    field: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

const PI: f32 = 3.14159265;
const SKY_COLOR: vec3<f32> = vec3<f32>(1.0, 0.6, 0.2);
const GROUND_COLOR: vec3<f32> = vec3<f32>(0.2, 0.6, 1.0);
const HEMI_INTENSITY: f32 = 3.0;
const SUN_COLOR: vec3<f32> = vec3<f32>(1.0, 0.9, 0.8);
const SUN_INTENSITY: f32 = 3.0;
const SUN_DIR: vec3<f32> = vec3<f32>(-0.57735027, 0.57735027, 0.57735027);

fn srgb_to_linear(c: vec3<f32>) -> vec3<f32> {
    return pow(c, vec3<f32>(2.2));
}

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = uniforms.field * mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_normal = normalize(world_normal);
    out.color = instance.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    let sky_weight = 0.5 * n.y + 0.5;
    let hemi = mix(GROUND_COLOR, SKY_COLOR, sky_weight) * HEMI_INTENSITY;
    let sun = SUN_COLOR * SUN_INTENSITY * max(dot(n, SUN_DIR), 0.0);
    let albedo = srgb_to_linear(in.color.rgb);
    return vec4<f32>(albedo * (hemi + sun) / PI, in.color.a);
}
"#;
