#![allow(dead_code)]

pub mod template;
