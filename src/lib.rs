/*
 *  lib.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Library root, the binary and the integration tests drive it
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

pub mod constants;
pub mod deutils;
pub mod geometry;

pub mod display;
pub mod input;

pub mod nowplaying;
pub mod httprpc;
pub mod poller;
pub mod demo;
pub mod artcache;

pub mod app_state;
pub mod screensaver;
pub mod pacer;
pub mod app;

pub mod config;
