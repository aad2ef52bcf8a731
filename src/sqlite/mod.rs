pub mod data_containers;
pub mod error;
pub mod query_engine;
pub mod utils;

#[cfg(test)]
pub mod test_support;

/* This module is the storage engine for the sqlite file format
* 1. utilities for decoding sqlite varints (big-endian, 7 bits per byte,
*    ninth byte contributes all 8 bits)
* 2. types that mirror the on-disk structures
*       - database file header (page size, text encoding)
*       - b-tree page and page header, four page kinds
*       - the four cell shapes (table/index x leaf/interior)
*       - records as parallel serial-type and value arrays
* 3. the query engine on top
*       - schema bootstrap from page 1
*       - full and row-id-restricted table b-tree walks with interval
*         pruning
*       - conservative index b-tree walks for equality probes
*       - the executor behind .dbinfo, .tables and restricted SELECT
* */
