pub mod fetch;
pub mod seed;
pub mod trigger;

#[cfg(test)]
pub(crate) mod test_support;
