mod common;

mod evidence;
