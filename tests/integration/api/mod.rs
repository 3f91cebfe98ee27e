// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod jobs_api_test;
mod proxy_test;
mod system_api_test;
mod tasks_api_test;
