pub mod classfile;
pub mod classpath;
