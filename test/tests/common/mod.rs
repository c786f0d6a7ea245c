mod account_tests;
mod storage_tests;
mod transaction_tests;
