pub mod face_mesh_client;
pub mod lip_compositor;
