/// ***********************************************************************
/// *****
/// * Copyright (c) 2025
/// The MIT License
///
/// Contributor: [shitohana](https://github.com/shitohana)
///
/// Source Code: https://github.com/shitohana/nfcnv
/// ***********************************************************************
/// ****
pub use {anyhow,
         arcstr,
         csv,
         hashbrown,
         itertools,
         log,
         num,
         pretty_env_logger,
         rand,
         rayon,
         serde,
         serde_json,
         statrs};
