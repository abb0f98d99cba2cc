pub mod lip_helper;
