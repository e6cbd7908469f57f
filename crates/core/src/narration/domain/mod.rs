pub mod sentence;
