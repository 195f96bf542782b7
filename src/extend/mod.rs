pub mod byte_pool;
