pub(crate) const LIT_VERTEX: &str = r#"#version 330 core
layout (location = 0) in vec3 aPos;
layout (location = 1) in vec3 aNormal;

uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;

out vec3 FragPos;
out vec3 Normal;

void main()
{
    FragPos = vec3(model * vec4(aPos, 1.0));
    Normal = mat3(transpose(inverse(model))) * aNormal;
    gl_Position = projection * view * vec4(FragPos, 1.0);
}
"#;

pub(crate) const LIT_FRAGMENT: &str = r#"#version 330 core
#define MAX_POINT_LIGHTS 4

struct Material {
    float shininess;
};

struct DirLight {
    vec3 direction;
    vec3 ambient;
    vec3 diffuse;
    vec3 specular;
};

struct PointLight {
    vec3 position;
    vec3 ambient;
    vec3 diffuse;
    vec3 specular;
    float constant;
    float linear;
    float quadratic;
};

struct SpotLight {
    vec3 position;
    vec3 direction;
    vec3 ambient;
    vec3 diffuse;
    vec3 specular;
    float constant;
    float linear;
    float quadratic;
    float cutOff;
    float outerCutOff;
};

uniform Material material;
uniform DirLight dirLight;
uniform PointLight pointLights[MAX_POINT_LIGHTS];
uniform int pointLightCount;
uniform SpotLight spotLight;
uniform vec3 viewPos;
uniform vec3 objectColor;

in vec3 FragPos;
in vec3 Normal;

out vec4 FragColor;

vec3 shade(vec3 lightDir, vec3 ambient, vec3 diffuse, vec3 specular, vec3 normal, vec3 viewDir)
{
    float diff = max(dot(normal, lightDir), 0.0);
    vec3 reflectDir = reflect(-lightDir, normal);
    float spec = pow(max(dot(viewDir, reflectDir), 0.0), material.shininess);
    return (ambient + diff * diffuse) * objectColor + spec * specular;
}

float attenuate(vec3 position, float constant, float linear, float quadratic)
{
    float distance = length(position - FragPos);
    return 1.0 / (constant + linear * distance + quadratic * (distance * distance));
}

void main()
{
    vec3 normal = normalize(Normal);
    vec3 viewDir = normalize(viewPos - FragPos);

    vec3 result = shade(normalize(-dirLight.direction), dirLight.ambient, dirLight.diffuse,
                        dirLight.specular, normal, viewDir);

    for (int i = 0; i < pointLightCount; i++) {
        vec3 lightDir = normalize(pointLights[i].position - FragPos);
        float attenuation = attenuate(pointLights[i].position, pointLights[i].constant,
                                      pointLights[i].linear, pointLights[i].quadratic);
        result += attenuation * shade(lightDir, pointLights[i].ambient, pointLights[i].diffuse,
                                      pointLights[i].specular, normal, viewDir);
    }

    vec3 spotDir = normalize(spotLight.position - FragPos);
    float theta = dot(spotDir, normalize(-spotLight.direction));
    float epsilon = spotLight.cutOff - spotLight.outerCutOff;
    float intensity = clamp((theta - spotLight.outerCutOff) / epsilon, 0.0, 1.0);
    float spotAttenuation = attenuate(spotLight.position, spotLight.constant,
                                      spotLight.linear, spotLight.quadratic);
    vec3 spotAmbient = spotLight.ambient * objectColor;
    vec3 spotLit = shade(spotDir, vec3(0.0), spotLight.diffuse, spotLight.specular, normal, viewDir);
    result += spotAttenuation * (spotAmbient + intensity * spotLit);

    FragColor = vec4(result, 1.0);
}
"#;

pub(crate) const LAMP_VERTEX: &str = r#"#version 330 core
layout (location = 0) in vec3 aPos;

uniform mat4 model;
uniform mat4 viewProjection;

void main()
{
    gl_Position = viewProjection * model * vec4(aPos, 1.0);
}
"#;

pub(crate) const LAMP_FRAGMENT: &str = r#"#version 330 core
uniform vec3 lampColor;

out vec4 FragColor;

void main()
{
    FragColor = vec4(lampColor, 1.0);
}
"#;

pub(crate) const CUBE_VERTICES: &[f32] = &[
    // positions        // normals
    -0.5, -0.5, 0.5, 0.0, 0.0, 1.0, 0.5, -0.5, 0.5, 0.0, 0.0, 1.0, 0.5, 0.5, 0.5, 0.0, 0.0, 1.0,
    -0.5, 0.5, 0.5, 0.0, 0.0, 1.0, -0.5, -0.5, -0.5, 0.0, 0.0, -1.0, 0.5, -0.5, -0.5, 0.0, 0.0,
    -1.0, 0.5, 0.5, -0.5, 0.0, 0.0, -1.0, -0.5, 0.5, -0.5, 0.0, 0.0, -1.0, -0.5, -0.5, -0.5, -1.0,
    0.0, 0.0, -0.5, -0.5, 0.5, -1.0, 0.0, 0.0, -0.5, 0.5, 0.5, -1.0, 0.0, 0.0, -0.5, 0.5, -0.5,
    -1.0, 0.0, 0.0, 0.5, -0.5, -0.5, 1.0, 0.0, 0.0, 0.5, -0.5, 0.5, 1.0, 0.0, 0.0, 0.5, 0.5, 0.5,
    1.0, 0.0, 0.0, 0.5, 0.5, -0.5, 1.0, 0.0, 0.0, -0.5, -0.5, -0.5, 0.0, -1.0, 0.0, 0.5, -0.5,
    -0.5, 0.0, -1.0, 0.0, 0.5, -0.5, 0.5, 0.0, -1.0, 0.0, -0.5, -0.5, 0.5, 0.0, -1.0, 0.0, -0.5,
    0.5, -0.5, 0.0, 1.0, 0.0, 0.5, 0.5, -0.5, 0.0, 1.0, 0.0, 0.5, 0.5, 0.5, 0.0, 1.0, 0.0, -0.5,
    0.5, 0.5, 0.0, 1.0, 0.0,
];

pub(crate) const CUBE_INDICES: &[u32] = &[
    0, 1, 2, 0, 2, 3, // front
    4, 6, 5, 4, 7, 6, // back
    8, 9, 10, 8, 10, 11, // left
    12, 14, 13, 12, 15, 14, // right
    16, 18, 17, 16, 19, 18, // bottom
    20, 21, 22, 20, 22, 23, // top
];

/// Floats per interleaved vertex: position then normal.
pub(crate) const CUBE_STRIDE: usize = 6;
