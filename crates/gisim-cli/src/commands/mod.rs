pub mod run;
pub mod specular;
