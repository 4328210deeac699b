// THIS FILE IS AUTOMATICALLY GENERATED, To edit it, see the release task in warehouse-tasks
pub const TITLE: &str = "warehouse";
pub const SUMMARY: &str = "Next Generation Python Package Index";
pub const URI: &str = "https://github.com/dstufft/warehouse";

pub const VERSION: &str = "0.1.0";

pub const AUTHOR: &str = "Donald Stufft";
pub const EMAIL: &str = "donald@stufft.io";

pub const LICENSE: &str = "Apache License, Version 2.0";
pub const COPYRIGHT: &str = "Copyright 2013 Donald Stufft";
