use std::rc::Rc;

use anyhow::{anyhow, Result};
use glow::HasContext;

use super::shared::{CUBE_INDICES, CUBE_STRIDE, CUBE_VERTICES};

type GlVertexArray = <glow::Context as HasContext>::VertexArray;
type GlBuffer = <glow::Context as HasContext>::Buffer;

/// Indexed triangle mesh with interleaved position/normal attributes.
///
/// Attribute 0 is the position and attribute 1 the normal. The GL objects are
/// released on drop.
pub struct Mesh {
    gl: Rc<glow::Context>,
    vertex_array: GlVertexArray,
    vertices: GlBuffer,
    indices: GlBuffer,
    index_count: i32,
}

impl Mesh {
    /// Uploads the unit cube centred on the origin.
    pub fn cube(gl: Rc<glow::Context>) -> Result<Self> {
        Self::new(gl, CUBE_VERTICES, CUBE_INDICES)
    }

    pub fn new(gl: Rc<glow::Context>, vertices: &[f32], indices: &[u32]) -> Result<Self> {
        let float_size = std::mem::size_of::<f32>() as i32;
        unsafe {
            let vertex_array = gl
                .create_vertex_array()
                .map_err(|err| anyhow!("failed to create vertex array: {err}"))?;
            let buffers = create_all(2, || gl.create_buffer(), |buffer| gl.delete_buffer(buffer));
            let (vertex_buffer, index_buffer) = match buffers {
                Ok(buffers) => (buffers[0], buffers[1]),
                Err(err) => {
                    gl.delete_vertex_array(vertex_array);
                    return Err(anyhow!("failed to create mesh buffer: {err}"));
                }
            };

            gl.bind_vertex_array(Some(vertex_array));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vertices),
                glow::STATIC_DRAW,
            );
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_buffer));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(indices),
                glow::STATIC_DRAW,
            );

            let stride = CUBE_STRIDE as i32 * float_size;
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, 3 * float_size);

            gl.bind_vertex_array(None);

            Ok(Self {
                gl,
                vertex_array,
                vertices: vertex_buffer,
                indices: index_buffer,
                index_count: indices.len() as i32,
            })
        }
    }

    /// Issues the draw call with whatever program is currently bound.
    pub fn draw(&self) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.vertex_array));
            self.gl
                .draw_elements(glow::TRIANGLES, self.index_count, glow::UNSIGNED_INT, 0);
        }
    }
}

/// Calls `create` `count` times. When a call fails, everything created so far
/// is passed to `delete` before the error is returned.
fn create_all<T>(
    count: usize,
    mut create: impl FnMut() -> Result<T, String>,
    mut delete: impl FnMut(T),
) -> Result<Vec<T>, String> {
    let mut created = Vec::with_capacity(count);
    for _ in 0..count {
        match create() {
            Ok(object) => created.push(object),
            Err(err) => {
                created.into_iter().for_each(&mut delete);
                return Err(err);
            }
        }
    }
    Ok(created)
}

impl Drop for Mesh {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_vertex_array(self.vertex_array);
            self.gl.delete_buffer(self.vertices);
            self.gl.delete_buffer(self.indices);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn create_all_releases_earlier_objects_on_failure() {
        let deleted = RefCell::new(Vec::new());
        let mut next = 0;
        let result = create_all(
            3,
            || {
                next += 1;
                if next == 3 {
                    Err("out of memory".to_string())
                } else {
                    Ok(next)
                }
            },
            |object| deleted.borrow_mut().push(object),
        );
        assert_eq!(result, Err("out of memory".to_string()));
        assert_eq!(*deleted.borrow(), vec![1, 2]);
    }

    #[test]
    fn create_all_keeps_every_object_on_success() {
        let mut next = 0;
        let result = create_all(
            2,
            || {
                next += 1;
                Ok(next)
            },
            |_: i32| panic!("nothing should be released"),
        );
        assert_eq!(result, Ok(vec![1, 2]));
    }
}
