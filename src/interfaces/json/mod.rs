pub mod outbound_writer;
