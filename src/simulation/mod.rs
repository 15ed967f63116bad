pub mod ledger_generator;
