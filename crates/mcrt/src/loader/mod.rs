pub mod obj;

pub use obj::ObjLoaderExt;
