mod helpers;

mod fund_test;
mod session_test;
